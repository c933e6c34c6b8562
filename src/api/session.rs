//! Session API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::common::HistoryQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{SessionCreatedResponse, SessionResponse};
use crate::services::history::HistoryPage;
use crate::services::validation::parse_uuid;

/// Build the session router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", post(create_session))
        .route("/session/{session_id}", get(get_session).delete(delete_session))
        .route("/session/{session_id}/history", get(get_history))
}

/// POST /api/v1/session - Create a session
async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreatedResponse>), ApiError> {
    let session = state.session_service.create().await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// GET /api/v1/session/{session_id} - Session details and current limits
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let id = parse_uuid(&session_id).ok_or_else(|| {
        ApiError::validation_error("Invalid session ID format")
            .with_details(vec![format!("'{}' is not a valid UUID", session_id)])
    })?;
    let session = state.session_service.get(id).await?;
    Ok(Json(SessionResponse::new(session, state.session_service.ttl())))
}

/// DELETE /api/v1/session/{session_id} - End a session and drop its data
async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&session_id).ok_or_else(|| {
        ApiError::validation_error("Invalid session ID format")
            .with_details(vec![format!("'{}' is not a valid UUID", session_id)])
    })?;
    state.session_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/session/{session_id}/history?limit=N - Newest analyses first
async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryPage>, ApiError> {
    let page = state
        .history_service
        .history(&session_id, query.limit.as_deref())
        .await?;
    Ok(Json(page))
}
