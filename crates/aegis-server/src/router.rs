//! Aegis Router
//!
//! HTTP router configuration with middleware stack. Defines the metrics API
//! routes and applies request tagging, tracing, CORS, and body limits.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::handlers;
use crate::middleware;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// =============================================================================
// Router
// =============================================================================

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", post(handlers::handle_batch))
        .route("/metrics/records", post(handlers::write_records))
        .route("/metrics/:app_id", delete(handlers::delete_app_metrics))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(state.config.body_limit_bytes))
        .layer(TraceLayer::new_for_http());

    if state.config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
        .layer(axum::middleware::from_fn(middleware::request_id))
        .with_state(state)
}

// =============================================================================
// Tests
// =============================================================================
