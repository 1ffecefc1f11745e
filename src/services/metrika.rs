// src/services/metrika.rs
//! Yandex Metrika reporting API client.
//!
//! Fetches aggregate visit/user/pageview totals and goal completion counts
//! for a date range using a server-held OAuth token.

use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

const STAT_API_URL: &str = "https://api-metrika.yandex.net/stat/v1/data";

#[derive(Debug, Error)]
pub enum MetrikaError {
    #[error("Metrika API returned status {status}")]
    Upstream { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

pub struct MetrikaService {
    http: Client,
    token: String,
    counter_id: String,
}

impl MetrikaService {
    pub fn new(http: Client, token: String, counter_id: String) -> Self {
        Self {
            http,
            token,
            counter_id,
        }
    }

    /// Fetch (visits, users, pageviews) totals for the date range.
    pub async fn fetch_totals(
        &self,
        date_start: &str,
        date_end: &str,
    ) -> Result<(f64, f64, f64), MetrikaError> {
        let data = self
            .request(&[
                ("ids", self.counter_id.as_str()),
                ("metrics", "ym:s:visits,ym:s:users,ym:s:pageviews"),
                ("date1", date_start),
                ("date2", date_end),
                ("accuracy", "full"),
            ])
            .await?;

        Ok(parse_totals(&data))
    }

    /// Fetch goal completion counts keyed by goal name for the date range.
    pub async fn fetch_goals(
        &self,
        date_start: &str,
        date_end: &str,
    ) -> Result<BTreeMap<String, f64>, MetrikaError> {
        let goal_metric = format!("ym:s:goal{}reaches", self.counter_id);
        let data = self
            .request(&[
                ("ids", self.counter_id.as_str()),
                ("metrics", goal_metric.as_str()),
                ("dimensions", "ym:s:goalDimension"),
                ("date1", date_start),
                ("date2", date_end),
                ("accuracy", "full"),
            ])
            .await?;

        Ok(parse_goals(&data))
    }

    async fn request(&self, query: &[(&str, &str)]) -> Result<Value, MetrikaError> {
        let response = self
            .http
            .get(STAT_API_URL)
            .query(query)
            .header("Authorization", format!("OAuth {}", self.token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MetrikaError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Extract the totals triple, defaulting missing entries to 0.
pub fn parse_totals(data: &Value) -> (f64, f64, f64) {
    let total = |i: usize| {
        data["totals"]
            .get(i)
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    };
    (total(0), total(1), total(2))
}

/// Reshape the goal report into a flat name → reaches map.
pub fn parse_goals(data: &Value) -> BTreeMap<String, f64> {
    let mut goals = BTreeMap::new();

    if let Some(rows) = data["data"].as_array() {
        for row in rows {
            let name = row["dimensions"]
                .get(0)
                .and_then(|d| d["name"].as_str());
            let reaches = row["metrics"].get(0).and_then(Value::as_f64);
            if let (Some(name), Some(reaches)) = (name, reaches) {
                goals.insert(name.to_string(), reaches);
            }
        }
    }

    goals
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_totals_reads_triple() {
        let data = json!({"totals": [120.0, 80.0, 340.0]});
        assert_eq!(parse_totals(&data), (120.0, 80.0, 340.0));
    }

    #[test]
    fn parse_totals_defaults_to_zero() {
        assert_eq!(parse_totals(&json!({})), (0.0, 0.0, 0.0));
        assert_eq!(parse_totals(&json!({"totals": [5.0]})), (5.0, 0.0, 0.0));
    }

    #[test]
    fn parse_goals_reshapes_rows() {
        let data = json!({
            "data": [
                {"dimensions": [{"name": "registration"}], "metrics": [12.0]},
                {"dimensions": [{"name": "tree_saved"}], "metrics": [7.0]}
            ]
        });

        let goals = parse_goals(&data);
        assert_eq!(goals.get("registration"), Some(&12.0));
        assert_eq!(goals.get("tree_saved"), Some(&7.0));
    }

    #[test]
    fn parse_goals_skips_malformed_rows() {
        let data = json!({
            "data": [
                {"dimensions": [], "metrics": [12.0]},
                {"dimensions": [{"name": "ok"}], "metrics": [3.0]}
            ]
        });

        let goals = parse_goals(&data);
        assert_eq!(goals.len(), 1);
        assert_eq!(goals.get("ok"), Some(&3.0));
    }
}
