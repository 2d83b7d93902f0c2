//! In-memory encoding of processed images.
//!
//! | Format | Encoder |
//! |--------|---------|
//! | AVIF | `image::codecs::avif::AvifEncoder` (rav1e) |
//! | WebP | `webp::Encoder` (lossy; the `image` crate only encodes lossless WebP) |
//! | JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Everything is normalized to RGB8 before encoding so identical
//! pipelines produce byte-identical output regardless of the source's
//! color type.

use image::DynamicImage;
use thiserror::Error;

use crate::registry::QualityProfile;
use crate::types::OutputFormat;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot encode {width}x{height} image")]
    DegenerateDimensions { width: u32, height: u32 },

    #[error("{format} encode failed: {message}")]
    EncodingFailed { format: OutputFormat, message: String },
}

/// Encode `img` as `format` with the category's quality profile,
/// returning the compressed bytes.
pub fn encode(
    img: &DynamicImage,
    format: OutputFormat,
    profile: &QualityProfile,
) -> Result<Vec<u8>, EncodeError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(EncodeError::DegenerateDimensions {
            width: img.width(),
            height: img.height(),
        });
    }

    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    match format {
        OutputFormat::Avif => {
            let mut buf = Vec::new();
            let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
                std::io::Cursor::new(&mut buf),
                profile.avif_speed,
                profile.avif_quality,
            );
            rgb.write_with_encoder(encoder)
                .map_err(|e| EncodeError::EncodingFailed {
                    format,
                    message: e.to_string(),
                })?;
            Ok(buf)
        }
        OutputFormat::Webp => {
            let encoder =
                webp::Encoder::from_image(&rgb).map_err(|e| EncodeError::EncodingFailed {
                    format,
                    message: e.to_string(),
                })?;
            Ok(encoder.encode(profile.webp_quality).to_vec())
        }
        OutputFormat::Jpeg => {
            let mut buf = Vec::new();
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                std::io::Cursor::new(&mut buf),
                profile.jpeg_quality,
            );
            rgb.write_with_encoder(encoder)
                .map_err(|e| EncodeError::EncodingFailed {
                    format,
                    message: e.to_string(),
                })?;
            Ok(buf)
        }
    }
}
