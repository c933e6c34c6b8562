//! Analysis API endpoints
//!
//! `POST /analyze` and `POST /video` run the full validation pipeline and
//! answer with the completed record plus `X-RateLimit-*` headers.
//! `GET /analyze/{request_id}` polls a stored record.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use crate::api::common::json_body;
use crate::api::middleware::{rate_limit_headers, ApiError, AppState};
use crate::api::responses::{AnalysisResponse, PendingAnalysisResponse};
use crate::services::analysis::AnalysisOutcome;

/// Build the analysis router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/analyze/{request_id}", get(get_analysis))
        .route("/video", post(generate_video))
}

/// POST /api/v1/analyze - Analyze uploaded images with a prompt
async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = json_body(payload)?;
    let outcome = state.analysis_service.analyze(&body).await?;
    completed_response(outcome)
}

/// POST /api/v1/video - Generate a video from a prompt and optional seed image
async fn generate_video(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = json_body(payload)?;
    let outcome = state.analysis_service.generate_video(&body).await?;
    completed_response(outcome)
}

fn completed_response(outcome: AnalysisOutcome) -> Result<Response, ApiError> {
    let headers = rate_limit_headers(&outcome.rate_limit);
    let body = AnalysisResponse::from_record(outcome.record)
        .ok_or_else(|| ApiError::internal_error("Analysis finished without a result"))?;
    Ok((StatusCode::OK, headers, Json(body)).into_response())
}

/// GET /api/v1/analyze/{request_id} - 200 when completed, 202 otherwise
async fn get_analysis(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<Response, ApiError> {
    let record = state.history_service.get(&request_id).await?;
    if !record.is_completed() {
        let pending = PendingAnalysisResponse::from(&record);
        return Ok((StatusCode::ACCEPTED, Json(pending)).into_response());
    }
    let body = AnalysisResponse::from_record(record)
        .ok_or_else(|| ApiError::internal_error("Analysis finished without a result"))?;
    Ok(Json(body).into_response())
}
