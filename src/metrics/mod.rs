//! # Metrics Module
//!
//! Proxies Yandex Metrika visit statistics for the admin dashboard,
//! reshaping the report into a flat summary.

pub mod handlers;
pub mod models;
pub mod routes;

pub use routes::metrics_routes;
