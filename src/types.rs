//! Shared value objects passed between the resolver, cache, transform
//! engine, and HTTP layer.
//!
//! [`TransformRequest`] is the central type: the exact parameter tuple that
//! names one derived image. Two requests with identical tuples always
//! produce byte-identical output, which is what makes the filename-keyed
//! cache and the long-lived HTTP caching headers safe.

use sha2::{Digest, Sha256};
use std::fmt;

/// Crop variant for a derived image.
///
/// Categories declare which variants they permit; a request carrying a
/// variant the category does not support is a validation error at the HTTP
/// boundary (and re-checked in the transform engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageVariant {
    /// 1:1 crop, entropy-anchored. Thumbnail-style.
    Square,
    /// 4:3 crop, attention-anchored.
    Horizontal,
}

impl ImageVariant {
    /// Short code used in query parameters and cache filenames.
    pub fn code(self) -> &'static str {
        match self {
            Self::Square => "sq",
            Self::Horizontal => "h",
        }
    }

    /// Parse the short code (`sq` / `h`). Returns `None` for anything else.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "sq" => Some(Self::Square),
            "h" => Some(Self::Horizontal),
            _ => None,
        }
    }
}

impl fmt::Display for ImageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Output encoding for a derived image.
///
/// Ordered by client preference: AVIF, then WebP, then JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Avif,
    Webp,
    Jpeg,
}

impl OutputFormat {
    /// All supported formats, preference-descending.
    pub fn all() -> &'static [OutputFormat] {
        &[Self::Avif, Self::Webp, Self::Jpeg]
    }

    /// File extension used in cache filenames.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Avif => "avif",
            Self::Webp => "webp",
            Self::Jpeg => "jpeg",
        }
    }

    /// MIME type for the `Content-Type` response header.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Avif => "image/avif",
            Self::Webp => "image/webp",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Parse a query-parameter value. Returns `None` for unsupported names.
    pub fn from_query(value: &str) -> Option<Self> {
        match value {
            "avif" => Some(Self::Avif),
            "webp" => Some(Self::Webp),
            "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One fully-validated derivation request.
///
/// By the time a value of this type exists, `category` is registered,
/// `base_name` is sanitization-safe, `size` is a member of the category's
/// width table, and `variant` is permitted for the category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformRequest {
    pub category: String,
    /// Logical base name, extension-free and sanitized.
    pub base_name: String,
    /// Requested output width in pixels.
    pub size: u32,
    pub format: OutputFormat,
    pub variant: Option<ImageVariant>,
}

impl TransformRequest {
    /// Deterministic cache filename: `{base}-{variant?}-{size}w.{format}`.
    ///
    /// The variant segment is omitted when no variant is requested, so
    /// `reiki-sq-400w.webp` and `reiki-400w.webp` are distinct artifacts.
    pub fn cache_filename(&self) -> String {
        match self.variant {
            Some(v) => format!("{}-{}-{}w.{}", self.base_name, v.code(), self.size, self.format),
            None => format!("{}-{}w.{}", self.base_name, self.size, self.format),
        }
    }

    /// ETag derived from the request tuple (first 16 hex chars of SHA-256).
    ///
    /// Not a content hash — the tuple already guarantees content
    /// determinism, so hashing the tuple is equivalent and avoids reading
    /// the artifact back.
    pub fn etag(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.category.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.base_name.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.size.to_le_bytes());
        hasher.update(match self.variant {
            Some(ImageVariant::Square) => b"\x01",
            Some(ImageVariant::Horizontal) => b"\x02",
            None => b"\x00",
        });
        hasher.update(self.format.extension().as_bytes());
        let digest = hasher.finalize();
        let hex: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
        format!("\"{hex}\"")
    }
}
