//! Metrics data models

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize, Debug)]
pub struct Period {
    pub start: String,
    pub end: String,
}

/// Flat statistics summary for the trailing 7-day window
#[derive(Serialize, Debug)]
pub struct MetricsSummary {
    pub visits: f64,
    pub users: f64,
    pub pageviews: f64,
    pub period: Period,
    pub goals: BTreeMap<String, f64>,
    pub timestamp: String,
}
