//! HTTP server for risk checks.
//!
//! Provides endpoints for:
//! - Streaming risk check (`/api/check-risk-stream`)
//! - Non-streaming risk check (`/api/check-risk`)
//! - Alert history (`/api/users/:user_id/alerts`)
//! - Liveness (`/`, `/health`)
//! - Prometheus metrics (`/metrics`)

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod error;
mod handlers;

pub use error::ApiError;

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Dashboard is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // API routes
        .route("/api/check-risk-stream", post(handlers::check_risk_stream))
        .route("/api/check-risk", post(handlers::check_risk))
        .route("/api/users/:user_id/alerts", get(handlers::alert_history))
        // Observability routes
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
