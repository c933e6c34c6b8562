//! Export API endpoint

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::api::common::ExportQuery;
use crate::api::middleware::{ApiError, AppState};

/// Build the export router
pub fn router() -> Router<AppState> {
    Router::new().route("/export/{request_id}", get(export_analysis))
}

/// GET /api/v1/export/{request_id}?format=json|markdown|txt
///
/// Sent as an attachment; only completed records can be exported.
async fn export_analysis(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state
        .history_service
        .export(&request_id, query.format.as_deref())
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    Ok((
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.body,
    ))
}
