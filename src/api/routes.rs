use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::health::HealthSnapshot;
use crate::api::latency::RunPercentiles;
use crate::config::RECENT_ROWS_DEFAULT_LIMIT;
use crate::db::models::OddsRow;
use crate::error::AppError;
use crate::pipeline::OddsPipeline;
use crate::types::AlertRecord;

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<OddsPipeline>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/odds/fetch", post(fetch_odds))
        .route("/api/odds/recent", get(get_recent_odds))
        .route("/api/alerts/latest", get(get_latest_alerts))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct FetchRequest {
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct FetchResponse {
    pub message: String,
    pub saved: usize,
    pub alerts: Vec<AlertRecord>,
}

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn fetch_odds(
    State(state): State<ApiState>,
    Json(req): Json<FetchRequest>,
) -> Result<Json<FetchResponse>, AppError> {
    let url = validate_url(req.url.as_deref())?;
    info!(url, "Fetch requested via API");

    let report = state.pipeline.run(url).await?;
    Ok(Json(FetchResponse {
        message: format!("Saved {} odds rows.", report.saved),
        saved: report.saved,
        alerts: report.alerts,
    }))
}

fn validate_url(url: Option<&str>) -> Result<&str, AppError> {
    let url = url.map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err(AppError::InvalidRequest("url is required".to_string()));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AppError::InvalidRequest(format!("not an http(s) URL: {url}")));
    }
    Ok(url)
}

async fn get_recent_odds(
    State(state): State<ApiState>,
    Query(params): Query<RecentQuery>,
) -> Result<Json<Vec<OddsRow>>, AppError> {
    let limit = params.limit.unwrap_or(RECENT_ROWS_DEFAULT_LIMIT).clamp(1, 1000);
    let rows = state.pipeline.writer().recent(limit).await?;
    Ok(Json(rows))
}

async fn get_latest_alerts(State(state): State<ApiState>) -> Json<Vec<AlertRecord>> {
    Json(state.pipeline.detector().latest_alerts())
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthSnapshot> {
    Json(state.pipeline.health().snapshot())
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<RunPercentiles> {
    Json(state.pipeline.timings().percentiles())
}
