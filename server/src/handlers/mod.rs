//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod health;
pub mod metrics;
pub mod ws;

use axum::{routing::get, Router};

use crate::AppState;

pub use health::health;
pub use metrics::get_metrics;
pub use ws::ws_handler;

/// Routes without rate limiting; `/ws` is added by `main` behind the governor
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
}
