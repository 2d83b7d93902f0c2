//! Reference resolution: normalizing client-supplied image identifiers.
//!
//! Clients may send a bare logical name (`reiki`), a filename (`reiki.jpg`),
//! or a full legacy path to a previously-derived artifact
//! (`/images/services/reiki-sq-400w.webp`). This module recovers the
//! canonical (base name, variant) pair from any of them.
//!
//! ## Patterns
//!
//! - `"reiki"` → base="reiki", variant=None
//! - `"reiki.jpg"` → base="reiki", variant=None
//! - `"/images/services/reiki-sq-400w.webp"` → base="reiki", variant=Square
//! - `"/images/hero/accueil-1920w.avif"` → base="accueil", variant=None
//! - `"soin-energetique-h-800w"` → base="soin-energetique", variant=Horizontal
//!
//! A variant recovered from the reference that the category does not permit
//! is silently dropped, not rejected: legacy paths are untrusted but
//! non-hostile, and degrading to the plain rendition beats failing the
//! request. The HTTP endpoint's explicit `v=` parameter is the opposite —
//! an unsupported variant there fails loudly. That asymmetry is deliberate;
//! do not unify the two behaviors.

use crate::registry::CategoryConfig;
use crate::types::ImageVariant;

/// Path prefixes marking a legacy derived-image reference.
const LEGACY_PREFIXES: &[&str] = &["/images/", "images/"];

/// Extensions stripped from bare references and legacy paths.
const KNOWN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "avif"];

/// A normalized image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    pub base_name: String,
    pub variant: Option<ImageVariant>,
}

/// Normalize a raw reference into (base name, variant).
///
/// Pure and total: never fails. Unrecognized shapes pass through as-is
/// (minus extension), and impermissible variants fall back to `None`.
pub fn resolve(raw_ref: &str, config: &CategoryConfig) -> ResolvedRef {
    let (stem, variant) = if is_legacy_path(raw_ref) {
        // Full path: keep only the filename, then peel extension and the
        // trailing `-{variant}-{size}w` derivation suffix.
        let filename = raw_ref.rsplit('/').next().unwrap_or(raw_ref);
        let stem = strip_known_extension(filename);
        strip_derivation_suffix(stem)
    } else {
        (strip_known_extension(raw_ref).to_string(), None)
    };

    // Silent fallback on impermissible variants (see module docs).
    let variant = variant.filter(|v| config.permits_variant(*v));

    ResolvedRef {
        base_name: stem,
        variant,
    }
}

fn is_legacy_path(raw_ref: &str) -> bool {
    LEGACY_PREFIXES.iter().any(|p| raw_ref.starts_with(p))
}

/// Strip one trailing known image extension, if present.
fn strip_known_extension(name: &str) -> &str {
    if let Some((stem, ext)) = name.rsplit_once('.') {
        if KNOWN_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
            return stem;
        }
    }
    name
}

/// Strip a trailing `-sq-400w` / `-h-800w` / `-400w` derivation suffix,
/// reporting the variant marker when one was embedded.
fn strip_derivation_suffix(stem: &str) -> (String, Option<ImageVariant>) {
    let Some((rest, tail)) = stem.rsplit_once('-') else {
        return (stem.to_string(), None);
    };
    if !is_size_segment(tail) {
        return (stem.to_string(), None);
    }

    // Size segment stripped; check for a variant marker right before it.
    if let Some((base, marker)) = rest.rsplit_once('-') {
        if let Some(variant) = ImageVariant::from_code(marker) {
            return (base.to_string(), Some(variant));
        }
    }
    // `rest` itself may be a bare variant marker ("sq-400w" alone).
    if let Some(variant) = ImageVariant::from_code(rest) {
        return (String::new(), Some(variant));
    }
    (rest.to_string(), None)
}

/// True for segments like `400w`: one or more digits followed by `w`.
fn is_size_segment(segment: &str) -> bool {
    segment
        .strip_suffix('w')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CategoryConfig, DEFAULT_PROFILE};

    fn config_with(variants: Vec<ImageVariant>) -> CategoryConfig {
        CategoryConfig {
            sizes: vec![400, 800],
            variants,
            aspect_ratio: None,
            profile: DEFAULT_PROFILE,
        }
    }

    fn permissive() -> CategoryConfig {
        config_with(vec![ImageVariant::Square, ImageVariant::Horizontal])
    }

    // =========================================================================
    // Bare references
    // =========================================================================

    #[test]
    fn bare_name_passes_through() {
        let r = resolve("reiki", &permissive());
        assert_eq!(r.base_name, "reiki");
        assert_eq!(r.variant, None);
    }

    #[test]
    fn bare_name_with_extension() {
        let r = resolve("reiki.jpg", &permissive());
        assert_eq!(r.base_name, "reiki");
        assert_eq!(r.variant, None);
    }

    #[test]
    fn bare_name_extension_case_insensitive() {
        let r = resolve("reiki.JPG", &permissive());
        assert_eq!(r.base_name, "reiki");
    }

    #[test]
    fn unknown_extension_is_kept() {
        // Not a known image extension, so the dot is part of the name.
        let r = resolve("archive.v2", &permissive());
        assert_eq!(r.base_name, "archive.v2");
    }

    #[test]
    fn bare_name_keeps_derivation_looking_suffix() {
        // Suffix stripping only applies to legacy paths; a bare name that
        // happens to end in `-400w` is taken literally.
        let r = resolve("promo-400w", &permissive());
        assert_eq!(r.base_name, "promo-400w");
    }

    // =========================================================================
    // Legacy paths
    // =========================================================================

    #[test]
    fn legacy_path_plain_size_suffix() {
        let r = resolve("/images/hero/accueil-1920w.avif", &permissive());
        assert_eq!(r.base_name, "accueil");
        assert_eq!(r.variant, None);
    }

    #[test]
    fn legacy_path_square_suffix() {
        let r = resolve("/images/services/reiki-sq-400w.webp", &permissive());
        assert_eq!(r.base_name, "reiki");
        assert_eq!(r.variant, Some(ImageVariant::Square));
    }

    #[test]
    fn legacy_path_horizontal_suffix() {
        let r = resolve("images/services/soin-energetique-h-800w.jpeg", &permissive());
        assert_eq!(r.base_name, "soin-energetique");
        assert_eq!(r.variant, Some(ImageVariant::Horizontal));
    }

    #[test]
    fn legacy_path_without_suffix() {
        let r = resolve("/images/about/portrait.jpg", &permissive());
        assert_eq!(r.base_name, "portrait");
        assert_eq!(r.variant, None);
    }

    #[test]
    fn legacy_path_multi_dash_base_name() {
        let r = resolve("/images/services/massage-bien-etre-400w.webp", &permissive());
        assert_eq!(r.base_name, "massage-bien-etre");
        assert_eq!(r.variant, None);
    }

    #[test]
    fn size_segment_requires_digits() {
        // "-www" and "-w" are not size segments.
        let r = resolve("/images/services/slow-w.jpg", &permissive());
        assert_eq!(r.base_name, "slow-w");
    }

    // =========================================================================
    // Variant permission fallback
    // =========================================================================

    #[test]
    fn impermissible_variant_falls_back_silently() {
        let no_variants = config_with(vec![]);
        let r = resolve("/images/testimonials/marie-sq-150w.webp", &no_variants);
        assert_eq!(r.base_name, "marie");
        assert_eq!(r.variant, None);
    }

    #[test]
    fn partially_permissive_category_keeps_allowed_variant() {
        let square_only = config_with(vec![ImageVariant::Square]);

        let r = resolve("/images/about/portrait-sq-400w.webp", &square_only);
        assert_eq!(r.variant, Some(ImageVariant::Square));

        let r = resolve("/images/about/portrait-h-400w.webp", &square_only);
        assert_eq!(r.variant, None);
    }
}
