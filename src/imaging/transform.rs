//! The transform pipeline: decode, resize/crop, encode.
//!
//! Every step is deterministic, so one request tuple always produces
//! the same bytes. That property is what lets the cache key on the
//! derived filename alone and lets concurrent cold-cache writers race
//! without coordination.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use image::imageops::FilterType;
use thiserror::Error;

use crate::imaging::anchor::{AnchorMode, crop_anchor};
use crate::imaging::calculations::{
    aspect_within_tolerance, crop_dimensions, fill_dimensions, fit_width,
};
use crate::imaging::encode::{EncodeError, encode};
use crate::registry::CategoryConfig;
use crate::types::{ImageVariant, TransformRequest};

/// Relative tolerance under which a source's natural aspect ratio is
/// treated as already matching a category's target ratio.
const ASPECT_TOLERANCE: f64 = 0.01;

/// Aspect ratio applied to horizontal variant crops.
const HORIZONTAL_ASPECT: (u32, u32) = (4, 3);

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("source image not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("variant '{variant}' is not enabled for category '{category}'")]
    InvalidVariant { variant: ImageVariant, category: String },

    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Run the full pipeline for one request against a located source file.
///
/// The shape of the output is decided by, in order: the category's
/// fixed aspect ratio, the requested variant, and otherwise a plain
/// proportional fit.
pub fn transform(
    source: &Path,
    request: &TransformRequest,
    config: &CategoryConfig,
) -> Result<Vec<u8>, TransformError> {
    if let Some(variant) = request.variant {
        if !config.permits_variant(variant) {
            return Err(TransformError::InvalidVariant {
                variant,
                category: request.category.clone(),
            });
        }
    }

    if !source.exists() {
        return Err(TransformError::SourceNotFound(source.to_path_buf()));
    }
    let img = image::open(source).map_err(|e| TransformError::Decode {
        path: source.to_path_buf(),
        message: e.to_string(),
    })?;

    let processed = shape(&img, request, config);
    Ok(encode(&processed, request.format, &config.profile)?)
}

/// Resize and crop without encoding. Split out so the geometry is
/// testable on synthetic images.
fn shape(img: &DynamicImage, request: &TransformRequest, config: &CategoryConfig) -> DynamicImage {
    let natural = (img.width(), img.height());
    let size = request.size;

    if let Some(aspect) = config.aspect_ratio {
        if aspect_within_tolerance(natural, aspect, ASPECT_TOLERANCE) {
            // Already the right shape. Downscale only.
            let (w, h) = fit_width(natural, size);
            return resize(img, w, h);
        }
        let (crop_w, crop_h) = crop_dimensions(size, aspect);
        return cover_crop(img, crop_w, crop_h, AnchorMode::Attention);
    }

    match request.variant {
        Some(ImageVariant::Square) => cover_crop(img, size, size, AnchorMode::Entropy),
        Some(ImageVariant::Horizontal) => {
            let (crop_w, crop_h) = crop_dimensions(size, HORIZONTAL_ASPECT);
            cover_crop(img, crop_w, crop_h, AnchorMode::Attention)
        }
        None => {
            let (w, h) = fit_width(natural, size);
            resize(img, w, h)
        }
    }
}

/// Resize to fully cover `crop_w` x `crop_h`, then cut the crop window
/// at the content-aware anchor.
fn cover_crop(img: &DynamicImage, crop_w: u32, crop_h: u32, mode: AnchorMode) -> DynamicImage {
    let (fill_w, fill_h) = fill_dimensions((img.width(), img.height()), (crop_w, crop_h));
    let filled = resize(img, fill_w, fill_h);
    let (x, y) = crop_anchor(&filled, crop_w, crop_h, mode);
    filled.crop_imm(x, y, crop_w, crop_h)
}

fn resize(img: &DynamicImage, w: u32, h: u32) -> DynamicImage {
    if (w, h) == (img.width(), img.height()) {
        return img.clone();
    }
    img.resize_exact(w, h, FilterType::Lanczos3)
}
