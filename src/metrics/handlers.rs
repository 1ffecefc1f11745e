//! Metrics proxy handlers

use axum::extract::{Extension, Json};
use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, warn};

use super::models::{MetricsSummary, Period};
use crate::common::{ApiError, AppState};
use crate::services::metrika::{MetrikaError, MetrikaService};

/// GET /api/metrics/summary
///
/// Fetches visit/user/pageview totals and goal completions for the trailing
/// 7 days. A failing goals request degrades the response to totals-only; a
/// failing totals request fails the whole call.
pub async fn metrics_summary(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<MetricsSummary>, ApiError> {
    let token = state
        .config
        .metrika_token
        .clone()
        .ok_or_else(|| ApiError::InternalServer("Metrika token not configured".to_string()))?;

    let date_end = Utc::now().format("%Y-%m-%d").to_string();
    let date_start = (Utc::now() - Duration::days(7)).format("%Y-%m-%d").to_string();

    let service = MetrikaService::new(
        state.http.clone(),
        token,
        state.config.metrika_counter_id.clone(),
    );

    let (visits, users, pageviews) = service
        .fetch_totals(&date_start, &date_end)
        .await
        .map_err(metrika_error)?;

    let goals = match service.fetch_goals(&date_start, &date_end).await {
        Ok(goals) => goals,
        Err(e) => {
            warn!(error = %e, "Failed to fetch Metrika goals, returning totals only");
            BTreeMap::new()
        }
    };

    Ok(Json(MetricsSummary {
        visits,
        users,
        pageviews,
        period: Period {
            start: date_start,
            end: date_end,
        },
        goals,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

fn metrika_error(e: MetrikaError) -> ApiError {
    match e {
        MetrikaError::Upstream { status, message } => {
            warn!(status = status, body = %message, "Metrika API returned an error");
            ApiError::Upstream {
                status,
                message: "Metrika API error".to_string(),
            }
        }
        MetrikaError::RequestFailed(e) => {
            error!(error = %e, "HTTP error contacting Metrika API");
            ApiError::InternalServer("Metrika API unavailable".to_string())
        }
    }
}
