//! Service configuration module.
//!
//! Handles loading and validating `config.toml`. All options are
//! optional — a missing file runs the service on stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! assets_root = "assets/images"  # Source images, one subdirectory per category
//! cache_root = "cache/images"    # Derived images are written here
//!
//! [server]
//! bind = "127.0.0.1:3000"        # Listen address for the HTTP server
//!
//! [processing]
//! max_processes = 4              # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Service configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only
/// specify the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Directory holding source images, one subdirectory per category.
    pub assets_root: PathBuf,
    /// Directory where derived images are cached.
    pub cache_root: PathBuf,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("assets/images"),
            cache_root: PathBuf::from("cache/images"),
            server: ServerConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assets_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation("assets_root must not be empty".into()));
        }
        if self.cache_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation("cache_root must not be empty".into()));
        }
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.bind is not a valid socket address: {}",
                self.server.bind
            )));
        }
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address, e.g. `"127.0.0.1:3000"`.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Load config from a `config.toml` file.
///
/// Returns stock defaults when the file doesn't exist. Rejects unknown
/// keys and validates the result.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    if !path.exists() {
        let config = ServiceConfig::default();
        config.validate()?;
        return Ok(config);
    }
    let content = fs::read_to_string(path)?;
    let config: ServiceConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Imagerie Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Directory holding source images, one subdirectory per category.
assets_root = "assets/images"

# Directory where derived images are cached. Safe to delete at any time;
# entries are regenerated on demand.
cache_root = "cache/images"

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
# Listen address for the HTTP server.
bind = "127.0.0.1:3000"

# ---------------------------------------------------------------------------
# Parallel processing (warm command)
# ---------------------------------------------------------------------------
[processing]
# Maximum number of parallel image processing workers.
# Omit for auto (one per CPU core). Values above the core count are
# clamped down.
#max_processes = 4
"##
}
