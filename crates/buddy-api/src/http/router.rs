//! Axum router configuration with middleware.
//!
//! Routes: `POST /api/buddy-ai` and `GET /health`.
//! Middleware: CORS restricted to the configured origins, request tracing.

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/buddy-ai", post(handlers::chat::buddy_ai))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the exact origin list, with credentials.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parse_origins(allowed_origins)))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Turn configured origins into header values.
///
/// Browsers send origins without a trailing slash, so one is stripped.
/// Blank entries, `*` (not allowed together with credentials) and values
/// that are not valid header text are skipped with a warning.
pub fn parse_origins(allowed_origins: &[String]) -> Vec<HeaderValue> {
    allowed_origins
        .iter()
        .filter_map(|origin| {
            let origin = origin.trim().trim_end_matches('/');
            if origin.is_empty() {
                return None;
            }
            if origin == "*" {
                warn!("Ignoring wildcard CORS origin; list origins explicitly");
                return None;
            }
            match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(origin, "Ignoring invalid CORS origin: {e}");
                    None
                }
            }
        })
        .collect()
}

/// GET /health
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
