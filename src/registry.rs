//! Category registry: the static declarative table driving validation and
//! transformation.
//!
//! Every image category maps to its valid output widths, permitted crop
//! variants, optional target aspect ratio, and encoding quality profile.
//! The registry is built once at startup and injected into the components
//! that need it — never imported as ambient global state — so tests can
//! substitute their own table.
//!
//! Invariants:
//! - every category has a non-empty, ascending width table;
//! - all categories serve the same three formats (AVIF, WebP, JPEG,
//!   preference-descending);
//! - a category with an empty variant set rejects any variant request at
//!   validation time — it does not silently ignore it.

use crate::types::{ImageVariant, OutputFormat};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid category: '{0}'")]
    UnknownCategory(String),
}

/// Encoding quality settings, fixed per format.
///
/// Values are clamped nowhere at runtime — profiles are compile-time
/// constants, and keeping them fixed is part of the determinism invariant
/// the cache relies on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityProfile {
    pub name: &'static str,
    /// AVIF quality (1-100) passed to the rav1e-backed encoder.
    pub avif_quality: u8,
    /// AVIF encoder speed (1-10); fixed so output bytes stay reproducible.
    pub avif_speed: u8,
    /// Lossy WebP quality factor (0.0-100.0).
    pub webp_quality: f32,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
}

/// Higher quality for above-the-fold banners.
pub const HERO_PROFILE: QualityProfile = QualityProfile {
    name: "hero",
    avif_quality: 80,
    avif_speed: 6,
    webp_quality: 85.0,
    jpeg_quality: 90,
};

/// More aggressive compression for everything else.
pub const DEFAULT_PROFILE: QualityProfile = QualityProfile {
    name: "default",
    avif_quality: 62,
    avif_speed: 6,
    webp_quality: 78.0,
    jpeg_quality: 82,
};

/// Per-category configuration. See the module docs for the invariants.
#[derive(Debug, Clone)]
pub struct CategoryConfig {
    /// Valid output widths, ascending.
    pub sizes: Vec<u32>,
    /// Crop variants this category permits. Empty means none.
    pub variants: Vec<ImageVariant>,
    /// Target aspect ratio as (width, height), e.g. `(16, 9)` for hero
    /// banners. `None` means plain proportional resizing.
    pub aspect_ratio: Option<(u32, u32)>,
    pub profile: QualityProfile,
}

impl CategoryConfig {
    /// Supported output formats, identical for every category.
    pub fn formats(&self) -> &'static [OutputFormat] {
        OutputFormat::all()
    }

    pub fn permits_variant(&self, variant: ImageVariant) -> bool {
        self.variants.contains(&variant)
    }

    pub fn permits_size(&self, size: u32) -> bool {
        self.sizes.contains(&size)
    }
}

/// Immutable lookup table from category name to [`CategoryConfig`].
#[derive(Debug, Clone)]
pub struct Registry {
    categories: BTreeMap<String, CategoryConfig>,
}

impl Registry {
    /// Build a registry from an explicit table. Used by tests to inject
    /// non-production configurations.
    pub fn new(categories: BTreeMap<String, CategoryConfig>) -> Self {
        Self { categories }
    }

    /// The production category table.
    pub fn builtin() -> Self {
        use ImageVariant::{Horizontal, Square};

        let mut categories = BTreeMap::new();
        categories.insert(
            "hero".to_string(),
            CategoryConfig {
                sizes: vec![768, 1280, 1920],
                variants: vec![],
                aspect_ratio: Some((16, 9)),
                profile: HERO_PROFILE,
            },
        );
        categories.insert(
            "services".to_string(),
            CategoryConfig {
                sizes: vec![400, 800],
                variants: vec![Square, Horizontal],
                aspect_ratio: None,
                profile: DEFAULT_PROFILE,
            },
        );
        categories.insert(
            "testimonials".to_string(),
            CategoryConfig {
                sizes: vec![150, 300],
                variants: vec![],
                aspect_ratio: None,
                profile: DEFAULT_PROFILE,
            },
        );
        categories.insert(
            "about".to_string(),
            CategoryConfig {
                sizes: vec![400, 800, 1200],
                variants: vec![Square],
                aspect_ratio: None,
                profile: DEFAULT_PROFILE,
            },
        );
        categories.insert(
            "logos".to_string(),
            CategoryConfig {
                sizes: vec![120, 240],
                variants: vec![],
                aspect_ratio: None,
                profile: DEFAULT_PROFILE,
            },
        );
        categories.insert(
            "qui-suis-je".to_string(),
            CategoryConfig {
                sizes: vec![400, 800],
                variants: vec![Square, Horizontal],
                aspect_ratio: None,
                profile: DEFAULT_PROFILE,
            },
        );
        Self { categories }
    }

    /// Pure lookup. Fails with [`RegistryError::UnknownCategory`] when the
    /// category is not registered.
    pub fn get(&self, category: &str) -> Result<&CategoryConfig, RegistryError> {
        self.categories
            .get(category)
            .ok_or_else(|| RegistryError::UnknownCategory(category.to_string()))
    }

    /// All registered (name, config) pairs, name-ordered.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryConfig)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }
}
