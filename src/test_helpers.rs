//! Shared test utilities for the imagerie test suite.
//!
//! Provides synthetic image generation and assets-tree seeding so
//! transform and cache tests don't ship binary fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::tempdir().unwrap();
//! seed_source(tmp.path(), "services", "reiki", 1600, 900);
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};

// =========================================================================
// Synthetic images
// =========================================================================

/// A deterministic non-uniform test image. The pattern carries enough
/// gradient and tonal variation to exercise the anchor scorers.
pub fn test_image(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, ((x * y) % 239) as u8])
    }))
}

/// Encode a test image as JPEG and write it to `path`.
pub fn write_test_jpeg(path: &Path, w: u32, h: u32) {
    let mut buf = Vec::new();
    test_image(w, h)
        .write_with_encoder(image::codecs::jpeg::JpegEncoder::new_with_quality(
            std::io::Cursor::new(&mut buf),
            90,
        ))
        .unwrap();
    std::fs::File::create(path).unwrap().write_all(&buf).unwrap();
}

// =========================================================================
// Assets tree seeding
// =========================================================================

/// Seed one source JPEG under `{assets_root}/{category}/{name}.jpg`,
/// creating the category directory as needed. Returns the file path.
pub fn seed_source(assets_root: &Path, category: &str, name: &str, w: u32, h: u32) -> PathBuf {
    let dir = assets_root.join(category);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{name}.jpg"));
    write_test_jpeg(&path, w, h);
    path
}
