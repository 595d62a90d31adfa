//! Axum router configuration

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::handlers::{convert, convert_custom_storage, debug_config, health_check, version_check};

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Browser clients POST JSON from other origins during development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::ORIGIN])
        .max_age(Duration::from_secs(3600));

    let mut router = Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        // Debug endpoints
        .route("/debug/config", get(debug_config))
        // Conversion endpoints
        .route("/convert", post(convert))
        .route("/convert/custom-storage", post(convert_custom_storage))
        // Middleware
        .layer(TraceLayer::new_for_http());

    if state.config.cors_enabled {
        router = router.layer(cors);
    }

    router.with_state(state)
}
