//! Health endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub avg_response_time_ms: f64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// GET /api/v1/health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = &state.request_stats;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: stats.uptime_seconds(),
        total_requests: stats.total_requests(),
        avg_response_time_ms: stats.avg_response_time_ms(),
    })
}
