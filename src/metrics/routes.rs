//! Metrics routes

use axum::{routing::get, Router};

use super::handlers;

/// Creates the metrics router
///
/// # Routes
/// - `GET /api/metrics/summary` - 7-day visit statistics summary
pub fn metrics_routes() -> Router {
    Router::new().route("/api/metrics/summary", get(handlers::metrics_summary))
}
