//! Cache pre-generation: derive every registered tuple ahead of traffic.
//!
//! The serve path generates derivatives lazily, which means the first
//! visitor after a deploy pays for every cold encode. The `warm`
//! command walks the assets tree and runs the full transform pipeline
//! for each source image crossed with its category's sizes, formats,
//! and permitted variants, filling the cache in parallel.
//!
//! Jobs run on the rayon pool (sized by `[processing]` config in
//! `main`). Failures are logged and counted but never abort the run —
//! one corrupt source should not block warming the rest of the tree.

use std::fmt;
use std::path::PathBuf;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::config::ServiceConfig;
use crate::imaging;
use crate::locate::SOURCE_EXTENSIONS;
use crate::registry::{CategoryConfig, Registry};
use crate::types::{ImageVariant, TransformRequest};

#[derive(Debug, Error)]
pub enum WarmError {
    #[error("failed to read assets directory {path}: {source}")]
    AssetsUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome counts for a warming run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WarmStats {
    /// Derivatives encoded and written during this run.
    pub generated: usize,
    /// Tuples whose cache entry already existed.
    pub skipped: usize,
    /// Tuples whose transform failed (logged individually).
    pub failed: usize,
}

impl fmt::Display for WarmStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} generated, {} cached, {} failed",
            self.generated, self.skipped, self.failed
        )
    }
}

/// One unit of work: a source file and the request tuple to derive.
struct WarmJob {
    source: PathBuf,
    request: TransformRequest,
    config: CategoryConfig,
}

/// Pre-generate every derivable tuple under the configured assets root.
///
/// With `force`, existing cache entries are regenerated and
/// overwritten; otherwise they count as skipped.
pub fn warm(config: &ServiceConfig, registry: &Registry, force: bool) -> Result<WarmStats, WarmError> {
    let cache = CacheStore::new(&config.cache_root);
    let jobs = collect_jobs(config, registry)?;
    info!(jobs = jobs.len(), "warming cache");

    let stats = jobs
        .par_iter()
        .map(|job| run_job(&cache, job, force))
        .reduce(WarmStats::default, |a, b| WarmStats {
            generated: a.generated + b.generated,
            skipped: a.skipped + b.skipped,
            failed: a.failed + b.failed,
        });
    Ok(stats)
}

fn run_job(cache: &CacheStore, job: &WarmJob, force: bool) -> WarmStats {
    let mut stats = WarmStats::default();
    if !force && cache.get(&job.request).is_some() {
        stats.skipped = 1;
        return stats;
    }
    match imaging::transform(&job.source, &job.request, &job.config) {
        Ok(bytes) => {
            cache.put(&job.request, &bytes);
            stats.generated = 1;
        }
        Err(e) => {
            warn!(
                source = %job.source.display(),
                file = %job.request.cache_filename(),
                error = %e,
                "warm transform failed"
            );
            stats.failed = 1;
        }
    }
    stats
}

/// Enumerate source files per category and cross them with the
/// category's registered sizes, formats, and variants.
fn collect_jobs(config: &ServiceConfig, registry: &Registry) -> Result<Vec<WarmJob>, WarmError> {
    let mut jobs = Vec::new();
    for (category, cat_config) in registry.iter() {
        let dir = config.assets_root.join(category);
        if !dir.is_dir() {
            continue;
        }
        let entries = std::fs::read_dir(&dir).map_err(|source| WarmError::AssetsUnreadable {
            path: dir.clone(),
            source,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(base_name) = source_base_name(&path) else {
                continue;
            };
            for request in category_requests(category, cat_config, &base_name) {
                jobs.push(WarmJob {
                    source: path.clone(),
                    request,
                    config: cat_config.clone(),
                });
            }
        }
    }
    Ok(jobs)
}

/// Base name of a source image file, or `None` for non-sources
/// (directories, sidecar files, unsupported extensions).
fn source_base_name(path: &std::path::Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    let ext = path.extension()?.to_str()?.to_lowercase();
    if !SOURCE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    Some(path.file_stem()?.to_str()?.to_string())
}

/// Every request tuple a category serves for one base name: each size
/// and format without a variant, plus each permitted variant.
fn category_requests(
    category: &str,
    config: &CategoryConfig,
    base_name: &str,
) -> Vec<TransformRequest> {
    let mut variants: Vec<Option<ImageVariant>> = vec![None];
    variants.extend(config.variants.iter().copied().map(Some));

    let mut requests = Vec::new();
    for &size in &config.sizes {
        for &format in config.formats() {
            for &variant in &variants {
                requests.push(TransformRequest {
                    category: category.to_string(),
                    base_name: base_name.to_string(),
                    size,
                    format,
                    variant,
                });
            }
        }
    }
    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::seed_source;
    use crate::types::OutputFormat;

    fn test_config(root: &std::path::Path) -> ServiceConfig {
        ServiceConfig {
            assets_root: root.join("assets"),
            cache_root: root.join("cache"),
            ..ServiceConfig::default()
        }
    }

    // =========================================================================
    // category_requests
    // =========================================================================

    #[test]
    fn requests_cross_sizes_formats_and_variants() {
        let registry = Registry::builtin();
        let config = registry.get("services").unwrap();
        let requests = category_requests("services", config, "reiki");
        // 2 sizes x 3 formats x (plain + sq + h)
        assert_eq!(requests.len(), 2 * 3 * 3);
    }

    #[test]
    fn variant_less_category_only_gets_plain_requests() {
        let registry = Registry::builtin();
        let config = registry.get("testimonials").unwrap();
        let requests = category_requests("testimonials", config, "x");
        assert_eq!(requests.len(), 2 * 3);
        assert!(requests.iter().all(|r| r.variant.is_none()));
    }

    // =========================================================================
    // warm
    // =========================================================================

    #[test]
    fn warm_generates_all_tuples_for_seeded_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        seed_source(&config.assets_root, "testimonials", "marie", 600, 400);

        let registry = Registry::builtin();
        let stats = warm(&config, &registry, false).unwrap();
        assert_eq!(stats.generated, 2 * 3);
        assert_eq!(stats.failed, 0);

        let cache = CacheStore::new(&config.cache_root);
        let request = TransformRequest {
            category: "testimonials".to_string(),
            base_name: "marie".to_string(),
            size: 150,
            format: OutputFormat::Jpeg,
            variant: None,
        };
        assert!(cache.get(&request).is_some());
    }

    #[test]
    fn second_run_skips_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        seed_source(&config.assets_root, "testimonials", "marie", 600, 400);

        let registry = Registry::builtin();
        warm(&config, &registry, false).unwrap();
        let stats = warm(&config, &registry, false).unwrap();
        assert_eq!(stats.generated, 0);
        assert_eq!(stats.skipped, 2 * 3);
    }

    #[test]
    fn force_regenerates_existing_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        seed_source(&config.assets_root, "testimonials", "marie", 600, 400);

        let registry = Registry::builtin();
        warm(&config, &registry, false).unwrap();
        let stats = warm(&config, &registry, true).unwrap();
        assert_eq!(stats.generated, 2 * 3);
        assert_eq!(stats.skipped, 0);
    }

    #[test]
    fn corrupt_source_counts_as_failed_without_aborting() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        seed_source(&config.assets_root, "testimonials", "marie", 600, 400);
        std::fs::write(config.assets_root.join("testimonials/broken.jpg"), b"junk").unwrap();

        let registry = Registry::builtin();
        let stats = warm(&config, &registry, false).unwrap();
        assert_eq!(stats.generated, 2 * 3);
        assert_eq!(stats.failed, 2 * 3);
    }

    #[test]
    fn missing_assets_root_warms_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let stats = warm(&config, &Registry::builtin(), false).unwrap();
        assert_eq!(stats, WarmStats::default());
    }

    #[test]
    fn stats_display_is_human_readable() {
        let stats = WarmStats {
            generated: 5,
            skipped: 2,
            failed: 1,
        };
        assert_eq!(stats.to_string(), "5 generated, 2 cached, 1 failed");
    }
}
