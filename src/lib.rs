//! # Imagerie
//!
//! An on-demand image derivation service. Source photographs sit in a
//! plain directory tree, one subdirectory per category, and the HTTP
//! endpoint serves resized, cropped, and re-encoded derivatives of
//! them, caching each result on disk so every tuple is only ever
//! computed once.
//!
//! # Architecture: One Deterministic Pipeline
//!
//! Every request flows through the same stages:
//!
//! ```text
//! 1. Validate   category + width + format + variant against the registry
//! 2. Resolve    raw image reference → logical base name (+ embedded variant)
//! 3. Locate     base name → source file (extension probing)
//! 4. Cache      tuple → derived file path; hit short-circuits here
//! 5. Transform  decode → shape (fit / cover-crop) → encode
//! ```
//!
//! The pipeline is deliberately deterministic: the same request tuple
//! always produces the same bytes. That single property carries a lot
//! of weight —
//!
//! - the cache can key on the derived filename alone, with no manifest
//!   or content hashing;
//! - concurrent cold-cache requests can race without locking, because
//!   the last writer writes the same bytes as the first;
//! - the `ETag` can be derived from the tuple instead of hashing
//!   response bodies.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`registry`] | Category table: valid widths, variants, aspect ratios, quality profiles |
//! | [`resolve`] | Raw image reference → logical base name (legacy path and suffix stripping) |
//! | [`locate`] | Base name → source file on disk, with sanitization and extension probing |
//! | [`cache`] | Filesystem store of derived images, keyed by the request tuple |
//! | [`imaging`] | Decode, content-aware crop, resize, and encode (AVIF/WebP/JPEG) |
//! | [`server`] | Axum HTTP endpoint: validation ladder, cache headers, error mapping |
//! | [`warm`] | Parallel cache pre-generation over the whole assets tree |
//! | [`config`] | `config.toml` loading and validation |
//! | [`types`] | The request tuple and its derived identities (filename, ETag) |
//!
//! # Design Decisions
//!
//! ## Pure-Rust Imaging (No ImageMagick, No FFmpeg)
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling),
//! `rav1e` for AVIF, and `libwebp` bindings for lossy WebP. No system
//! binaries to install or version-match; the service is a single
//! self-contained executable.
//!
//! ## Content-Aware Crops
//!
//! Fixed-aspect crops (hero banners, square and horizontal variants)
//! don't blindly center. A downscaled analysis pass scores candidate
//! crop windows — gradient energy for wide crops, luma entropy for
//! squares — and the window keeps the subject. See [`imaging::anchor`].
//!
//! ## Lazy Derivation With Optional Warming
//!
//! Derivatives are created on first request, so deploys ship no build
//! step. Operators who care about cold-start latency run `imagerie
//! warm` to pre-fill the cache in parallel before cutting traffic over.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod locate;
pub mod registry;
pub mod resolve;
pub mod server;
pub mod types;
pub mod warm;

#[cfg(test)]
pub(crate) mod test_helpers;
