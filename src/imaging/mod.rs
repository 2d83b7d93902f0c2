//! Image processing — decode, shape, encode, all in-process.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::open` |
//! | **Resize** | Lanczos3 (`resize_exact`) |
//! | **Crop anchor** | gradient energy / luma entropy scoring |
//! | **Encode → AVIF** | `image::codecs::avif::AvifEncoder` (rav1e) |
//! | **Encode → WebP** | `webp::Encoder` (lossy) |
//! | **Encode → JPEG** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Anchor**: Content-aware crop window placement
//! - **Encode**: In-memory encoding with per-category quality profiles
//! - **Transform**: The full pipeline for one request

pub mod anchor;
pub mod calculations;
pub mod encode;
pub mod transform;

pub use anchor::{AnchorMode, crop_anchor};
pub use encode::{EncodeError, encode};
pub use transform::{TransformError, transform};
