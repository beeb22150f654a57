//! Router configuration for the analysis service.
//!
//! # Route Structure
//!
//! ```text
//! /health                          - Health check
//! /uploads/{kind}                  - List uploaded rasters (GET)
//! /analyses/{kind}/{image_id}      - Dispatch an analysis job (POST)
//! /pyramids/{kind}/{image_id}      - Cut a tile pyramid (POST)
//! /tiles/...                       - Static pyramid files
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tileweld::server::routes::{create_router, RouterConfig};
//!
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(app_state, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{
    build_pyramid_handler, health_handler, list_uploads_handler, start_analysis_handler, AppState,
};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone, Default)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None, // Allow any origin by default
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Health check
/// - Analysis dispatch and pyramid build endpoints
/// - CORS configuration
/// - Request tracing (optional)
///
/// # Arguments
///
/// * `app_state` - Shared service state for the handlers
/// * `config` - Router configuration
///
/// # Returns
///
/// A configured Axum router ready to be served.
pub fn create_router(app_state: AppState, config: RouterConfig) -> Router {
    let cors = build_cors_layer(&config);

    // Cut pyramids are plain files; viewers fetch descriptor and tiles
    // straight from the tiles tree
    let tiles_root = app_state.analysis.tiles_dir().to_path_buf();

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/uploads/{kind}", get(list_uploads_handler))
        .route("/analyses/{kind}/{image_id}", post(start_analysis_handler))
        .route("/pyramids/{kind}/{image_id}", post(build_pyramid_handler))
        .nest_service("/tiles", ServeDir::new(tiles_root))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            // Parse origins into HeaderValues
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
