use clap::{Parser, Subcommand};
use imagerie::{config, imaging, locate, registry, resolve, server, types, warm};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imagerie")]
#[command(about = "On-demand image derivation service")]
#[command(long_about = "\
On-demand image derivation service

Source images live in a plain directory tree, one subdirectory per
category:

  assets/images/
  ├── hero/
  │   └── accueil.jpg
  ├── services/
  │   ├── reiki.jpg
  │   └── massage.png
  └── testimonials/
      └── marie.jpg

The server derives resized, cropped, and re-encoded variants on demand:

  GET /api/images/services/reiki?w=400&f=webp&v=sq

Each derivative is cached on disk after the first request. The cache
directory is safe to delete at any time.

Run 'imagerie gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Pre-generate every registered derivative into the cache
    Warm {
        /// Regenerate and overwrite existing cache entries
        #[arg(long)]
        force: bool,
    },
    /// Derive a single image to a file (no server, no cache)
    Transform {
        /// Category name, e.g. "services"
        category: String,
        /// Image reference, e.g. "reiki" or a legacy path
        image: String,
        /// Output width in pixels
        #[arg(short, long)]
        width: u32,
        /// Output format: avif, webp, or jpeg
        #[arg(short, long, default_value = "webp")]
        format: String,
        /// Crop variant: sq or h
        #[arg(short, long)]
        variant: Option<String>,
        /// Output file (defaults to the derived filename in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate config and report the assets tree against the registry
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imagerie=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            let service_config = config::load_config(&cli.config)?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(&service_config, registry::Registry::builtin()))?;
        }
        Command::Warm { force } => {
            let service_config = config::load_config(&cli.config)?;
            init_thread_pool(&service_config.processing);
            let registry = registry::Registry::builtin();
            let stats = warm::warm(&service_config, &registry, force)?;
            println!("Cache: {stats}");
        }
        Command::Transform {
            category,
            image,
            width,
            format,
            variant,
            output,
        } => {
            let service_config = config::load_config(&cli.config)?;
            let registry = registry::Registry::builtin();
            let cat_config = registry.get(&category)?;

            let resolved = resolve::resolve(&image, cat_config);
            let variant = match variant.as_deref() {
                Some(code) => Some(
                    types::ImageVariant::from_code(code)
                        .ok_or_else(|| format!("invalid variant '{code}' (expected sq or h)"))?,
                ),
                None => resolved.variant,
            };
            let format = types::OutputFormat::from_query(&format)
                .ok_or_else(|| format!("invalid format '{format}' (expected avif, webp, or jpeg)"))?;

            // The tuple carries the sanitized name, matching the server.
            let base_name = locate::sanitize_base_name(&resolved.base_name)?;
            let request = types::TransformRequest {
                category: category.clone(),
                base_name,
                size: width,
                format,
                variant,
            };
            let source = locate::locate(&service_config.assets_root, &category, &request.base_name)?;
            let bytes = imaging::transform(&source, &request, cat_config)?;
            let output = output.unwrap_or_else(|| PathBuf::from(request.cache_filename()));
            std::fs::write(&output, &bytes)?;
            println!("{} ({} bytes)", output.display(), bytes.len());
        }
        Command::Check => {
            let service_config = config::load_config(&cli.config)?;
            println!("==> Config OK ({})", cli.config.display());
            let registry = registry::Registry::builtin();
            check_assets(&service_config, &registry);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Report which registered categories have a source directory and how
/// many source images each holds.
fn check_assets(service_config: &config::ServiceConfig, registry: &registry::Registry) {
    println!("==> Assets root: {}", service_config.assets_root.display());
    for (category, _) in registry.iter() {
        let dir = service_config.assets_root.join(category);
        if !dir.is_dir() {
            println!("    {category}: missing directory");
            continue;
        }
        let count = std::fs::read_dir(&dir)
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|e| {
                        e.path()
                            .extension()
                            .and_then(|ext| ext.to_str())
                            .is_some_and(|ext| {
                                locate::SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
                            })
                    })
                    .count()
            })
            .unwrap_or(0);
        println!("    {category}: {count} source image(s)");
    }
}
