//! Source image location: mapping (category, base name) to a file on disk.
//!
//! Raw sources live at `{assets_root}/{category}/{base}.{ext}` and are
//! created out-of-band by content authors — this module only ever reads.
//! The extension probe order is an explicit, documented list
//! ([`SOURCE_EXTENSIONS`]) rather than inline control flow, so the behavior
//! is independently verifiable.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("Invalid image name: '{0}'")]
    InvalidImageName(String),
}

/// Extensions tried, in order, when locating a raw source image.
pub const SOURCE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Sanitize a base name down to the `[A-Za-z0-9._-]` allowlist.
///
/// Path separators and NUL bytes fail outright rather than being stripped:
/// a reference that ever contained one is structurally suspect, and failing
/// loudly here is what makes directory traversal impossible by
/// construction. An input that sanitizes to nothing also fails.
pub fn sanitize_base_name(raw: &str) -> Result<String, LocateError> {
    if raw.contains(['/', '\\', '\0']) {
        return Err(LocateError::InvalidImageName(raw.to_string()));
    }
    let sanitized: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if sanitized.is_empty() {
        return Err(LocateError::InvalidImageName(raw.to_string()));
    }
    Ok(sanitized)
}

/// Resolve the source path for (category, base name).
///
/// Probes [`SOURCE_EXTENSIONS`] in order and returns the first existing
/// path. When nothing exists, returns the first candidate anyway: callers
/// detect absence at open time, which keeps this function side-effect-free
/// beyond existence checks.
pub fn locate(assets_root: &Path, category: &str, base_name: &str) -> Result<PathBuf, LocateError> {
    let base = sanitize_base_name(base_name)?;
    let dir = assets_root.join(category);

    let mut first_candidate = None;
    for ext in SOURCE_EXTENSIONS {
        let candidate = dir.join(format!("{base}.{ext}"));
        if candidate.exists() {
            return Ok(candidate);
        }
        if first_candidate.is_none() {
            first_candidate = Some(candidate);
        }
    }
    // SOURCE_EXTENSIONS is non-empty, so first_candidate is set.
    Ok(first_candidate.unwrap_or_else(|| dir.join(base)))
}
