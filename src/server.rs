//! HTTP server: the image derivation endpoint.
//!
//! One route does the real work:
//!
//! ```text
//! GET /api/images/{category}/{imageName}?w={width}&f={format}&v={variant}&force={0|1|true}
//! ```
//!
//! The handler validates the request against the category registry,
//! resolves the image reference, then serves from the cache store or
//! runs the transform pipeline on a blocking thread. Successful
//! responses carry a one-year immutable `Cache-Control` and an `ETag`
//! derived from the request tuple; the pipeline's determinism makes
//! the tuple as good an identity as a content hash.
//!
//! Errors map to status codes by type: validation failures are 400
//! with a message precise enough to self-correct (invalid sizes list
//! the valid ones), missing sources are 404, and everything else is a
//! logged 500 with a generic body.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::cache::CacheStore;
use crate::config::ServiceConfig;
use crate::imaging::TransformError;
use crate::locate;
use crate::registry::Registry;
use crate::resolve;
use crate::types::{ImageVariant, OutputFormat, TransformRequest};

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub registry: Arc<Registry>,
    pub cache: CacheStore,
    pub assets_root: PathBuf,
}

impl AppContext {
    pub fn new(config: &ServiceConfig, registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            cache: CacheStore::new(&config.cache_root),
            assets_root: config.assets_root.clone(),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/images/:category/:image_name", get(serve_image))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &ServiceConfig, registry: Registry) -> std::io::Result<()> {
    let ctx = AppContext::new(config, registry);
    let app = create_router(ctx);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(addr = %config.server.bind, "listening");
    axum::serve(listener, app).await
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// ============================================================================
// Request types
// ============================================================================

/// Query parameters for the derivation endpoint. Everything arrives as
/// an optional string so validation can produce precise messages
/// instead of axum's generic deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    /// Requested width in pixels. Required, must be in the category's set.
    pub w: Option<String>,
    /// Output format: `avif`, `webp`, or `jpeg`. Required.
    pub f: Option<String>,
    /// Crop variant: `sq` or `h`. Optional.
    pub v: Option<String>,
    /// Cache bypass flag: `1` or `true` regenerates unconditionally.
    pub force: Option<String>,
}

/// `force` accepts `1` or `true` (ASCII case-insensitive); anything
/// else, including absence, means false.
fn parse_force(raw: Option<&str>) -> bool {
    matches!(raw, Some(s) if s == "1" || s.eq_ignore_ascii_case("true"))
}

// ============================================================================
// Error mapping
// ============================================================================

/// Request failures, mapped to status codes by type rather than by
/// string-matching error messages.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            ApiError::Internal(msg) => {
                error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()).into_response()
            }
        }
    }
}

impl From<TransformError> for ApiError {
    fn from(e: TransformError) -> Self {
        match e {
            TransformError::SourceNotFound(path) => {
                ApiError::NotFound(format!("source image not found: {}", path.display()))
            }
            TransformError::InvalidVariant { .. } => ApiError::Validation(e.to_string()),
            TransformError::Decode { .. } | TransformError::Encode(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

// ============================================================================
// Handler
// ============================================================================

/// Serve a derived image, transforming and caching on demand.
async fn serve_image(
    State(ctx): State<AppContext>,
    Path((category, image_name)): Path<(String, String)>,
    Query(query): Query<ImageQuery>,
) -> Result<Response, ApiError> {
    let config = ctx.registry.get(&category).map_err(|_| {
        let known: Vec<&str> = ctx.registry.iter().map(|(name, _)| name).collect();
        ApiError::Validation(format!(
            "Invalid category '{category}'. Valid categories: {}",
            known.join(", ")
        ))
    })?;

    let resolved = resolve::resolve(&image_name, config);

    // Sanitize once, here. The tuple, and with it the cache filename
    // and ETag, must carry the sanitized name so aliased raw refs to
    // the same source share one cache artifact.
    let base_name = locate::sanitize_base_name(&resolved.base_name)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let size = parse_size(query.w.as_deref(), &category, config)?;

    let format = match query.f.as_deref() {
        Some(raw) => OutputFormat::from_query(raw).ok_or_else(|| {
            ApiError::Validation(format!("Invalid format '{raw}'. Valid formats: avif, webp, jpeg"))
        })?,
        None => {
            return Err(ApiError::Validation(
                "Missing required parameter 'f'. Valid formats: avif, webp, jpeg".to_string(),
            ));
        }
    };

    // An explicit query variant overrides anything embedded in the
    // reference, and unlike the embedded kind it fails hard when the
    // category doesn't support it.
    let variant = match query.v.as_deref() {
        Some(code) => {
            let variant = ImageVariant::from_code(code).ok_or_else(|| {
                ApiError::Validation(format!("Invalid variant '{code}'. Valid variants: sq, h"))
            })?;
            if !config.permits_variant(variant) {
                return Err(ApiError::Validation(format!(
                    "Invalid variant '{code}' for category '{category}'"
                )));
            }
            Some(variant)
        }
        None => resolved.variant,
    };

    let force = parse_force(query.force.as_deref());

    let source = locate::locate(&ctx.assets_root, &category, &base_name)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let request = TransformRequest {
        category,
        base_name,
        size,
        format,
        variant,
    };

    // Decoding and encoding are CPU-bound; keep them off the async
    // runtime threads.
    let cache = ctx.cache.clone();
    let config = config.clone();
    let req = request.clone();
    let (bytes, _cached) = tokio::task::spawn_blocking(move || {
        cache.get_or_create(&req, force, || crate::imaging::transform(&source, &req, &config))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("transform task panicked: {e}")))??;

    let cache_control = if force {
        "no-cache"
    } else {
        "public, max-age=31536000, immutable"
    };
    let etag = request.etag();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, request.format.content_type()),
            (header::CACHE_CONTROL, cache_control),
            (header::ETAG, etag.as_str()),
        ],
        bytes,
    )
        .into_response())
}

fn parse_size(
    raw: Option<&str>,
    category: &str,
    config: &crate::registry::CategoryConfig,
) -> Result<u32, ApiError> {
    let sizes = config
        .sizes
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let raw = raw.ok_or_else(|| {
        ApiError::Validation(format!(
            "Missing required parameter 'w'. Valid sizes for '{category}': {sizes}"
        ))
    })?;
    let size: u32 = raw
        .parse()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "Invalid size '{raw}' for category '{category}'. Valid sizes: {sizes}"
            ))
        })?;
    if !config.permits_size(size) {
        return Err(ApiError::Validation(format!(
            "Invalid size '{size}' for category '{category}'. Valid sizes: {sizes}"
        )));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    // =========================================================================
    // parse_force
    // =========================================================================

    #[test]
    fn force_accepts_one_and_true() {
        assert!(parse_force(Some("1")));
        assert!(parse_force(Some("true")));
        assert!(parse_force(Some("TRUE")));
        assert!(parse_force(Some("True")));
    }

    #[test]
    fn force_defaults_to_false() {
        assert!(!parse_force(None));
        assert!(!parse_force(Some("0")));
        assert!(!parse_force(Some("false")));
        assert!(!parse_force(Some("yes")));
        assert!(!parse_force(Some("")));
    }

    // =========================================================================
    // parse_size
    // =========================================================================

    #[test]
    fn size_outside_category_set_names_valid_sizes() {
        let registry = Registry::builtin();
        let config = registry.get("services").unwrap();
        let err = parse_size(Some("9999"), "services", config).unwrap_err();
        let ApiError::Validation(msg) = err else {
            panic!("expected validation error");
        };
        assert!(msg.contains("Invalid size"));
        assert!(msg.contains("400"));
        assert!(msg.contains("800"));
    }

    #[test]
    fn size_must_be_a_positive_integer() {
        let registry = Registry::builtin();
        let config = registry.get("services").unwrap();
        for raw in ["0", "-400", "abc", "400.5"] {
            assert!(
                matches!(parse_size(Some(raw), "services", config), Err(ApiError::Validation(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn missing_size_is_a_validation_error() {
        let registry = Registry::builtin();
        let config = registry.get("services").unwrap();
        let err = parse_size(None, "services", config).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn registered_size_parses() {
        let registry = Registry::builtin();
        let config = registry.get("services").unwrap();
        assert_eq!(parse_size(Some("400"), "services", config).unwrap(), 400);
    }

    // =========================================================================
    // Error mapping
    // =========================================================================

    #[test]
    fn transform_errors_map_to_expected_statuses() {
        let not_found: ApiError = TransformError::SourceNotFound(PathBuf::from("/x")).into();
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let invalid: ApiError = TransformError::InvalidVariant {
            variant: ImageVariant::Square,
            category: "testimonials".to_string(),
        }
        .into();
        assert!(matches!(invalid, ApiError::Validation(_)));

        let decode: ApiError = TransformError::Decode {
            path: PathBuf::from("/x"),
            message: "bad".to_string(),
        }
        .into();
        assert!(matches!(decode, ApiError::Internal(_)));
    }
}
