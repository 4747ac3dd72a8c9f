//! Router assembly for the captcha gateway.
//!
//! This module defines the HTTP routes and applies the CORS and audit
//! middleware.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                 - greeting
//! POST /ocr              - OCR on an uploaded file
//! POST /ocr/base64       - OCR on a base64 JSON payload
//! POST /detect           - bounding-box detection
//! POST /slide            - slider match
//! POST /slide_comparison - slider comparison
//! ```
//!
//! # Example
//!
//! ```ignore
//! use captcha_gateway::engine::RemoteEngine;
//! use captcha_gateway::server::{create_router, RouterConfig};
//! use std::time::Duration;
//!
//! let engines = RemoteEngine::connect("http://engine:9000", Duration::from_secs(30))?;
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(engines, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::engine::{EngineSet, RecognitionEngine};

use super::audit::audit_middleware;
use super::handlers::{
    detect_handler, ocr_base64_handler, ocr_handler, root_handler, slide_comparison_handler,
    slide_handler, AppState,
};

/// Default cap on request body size (16 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// How long browsers may cache a preflight answer, in seconds.
pub const PREFLIGHT_MAX_AGE_SECS: u64 = 3600;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = reflect the request origin)
    pub cors_origins: Option<Vec<String>>,

    /// Optional path prefix the API is nested under (e.g. "/api")
    pub path_prefix: Option<String>,

    /// Cap on request body size in bytes
    pub max_body_bytes: usize,

    /// Whether to enable transport-level request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with defaults.
    ///
    /// By default:
    /// - CORS reflects the request origin (use an allow-list in production)
    /// - No path prefix
    /// - 16 MiB body cap
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            path_prefix: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            enable_tracing: true,
        }
    }

    /// Set the explicit allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin reads.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Nest the whole API under a path prefix (must start with `/`).
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    /// Set the request body size cap in bytes.
    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    /// Enable or disable transport-level tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Builds the complete Axum router with the recognition routes, the audit
/// middleware and the CORS policy. Layer order, outermost first: optional
/// transport trace, CORS, audit, body-size cap, routes. Preflights are
/// answered by the CORS layer without reaching the audit log or a handler.
///
/// # Arguments
///
/// * `engines` - The engine handle set, created once at startup
/// * `config` - Router configuration
pub fn create_router<E>(engines: EngineSet<E>, config: RouterConfig) -> Router
where
    E: RecognitionEngine + 'static,
{
    let state = AppState::new(engines);
    let cors = build_cors_layer(&config);

    let api = Router::new()
        .route("/", get(root_handler))
        .route("/ocr", post(ocr_handler::<E>))
        .route("/ocr/base64", post(ocr_base64_handler::<E>))
        .route("/detect", post(detect_handler::<E>))
        .route("/slide", post(slide_handler::<E>))
        .route("/slide_comparison", post(slide_comparison_handler::<E>))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes));

    let router = match config.path_prefix {
        Some(ref prefix) if !prefix.is_empty() && prefix != "/" => {
            Router::new().nest(prefix, api)
        }
        _ => api,
    };

    let router = router
        .layer(middleware::from_fn(audit_middleware))
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
///
/// Responses are credentialed, so neither origins nor headers may use the
/// `*` wildcard; the header allow-list mirrors whatever the preflight asks
/// for, and origins are either an explicit list or a reflection of the
/// request origin.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(PREFLIGHT_MAX_AGE_SECS));

    match &config.cors_origins {
        None => cors.allow_origin(AllowOrigin::mirror_request()),
        Some(origins) => {
            let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
