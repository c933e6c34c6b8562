//! Upload API endpoints
//!
//! Accepts multipart/form-data with a `sessionId` text field and up to five
//! image parts named `images` (or `images[]`).

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState};
use crate::config::UploadConfig;
use crate::models::{UploadInput, UploadedImageInfo};

/// Response for a successful upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub images: Vec<UploadedImageInfo>,
    pub total_size_bytes: u64,
    pub session_id: Uuid,
}

/// Build the upload router; the body limit is sized from the upload caps
pub fn router(config: &UploadConfig) -> Router<AppState> {
    Router::new().route(
        "/images",
        post(upload_images).layer(DefaultBodyLimit::max(config.body_limit())),
    )
}

/// POST /api/v1/images - Upload a batch of images for a session
async fn upload_images(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let limits = &state.config.upload;
    let mut session_id: Option<String> = None;
    let mut files = Vec::new();
    let mut received: u64 = 0;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        ApiError::validation_error("Failed to read multipart body").with_details(vec![e.body_text()])
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "sessionId" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::validation_error("Failed to read sessionId field")
                        .with_details(vec![e.body_text()])
                })?;
                session_id = Some(value);
            }
            "images" | "images[]" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                // Past either cap the batch is rejected, so only the size is kept
                let keep = files.len() < limits.max_files && received <= limits.max_total_size;
                let mut buffer = Vec::new();
                let mut size: u64 = 0;
                while let Some(chunk) = field.chunk().await.map_err(|e| {
                    ApiError::validation_error(format!("Failed to read {}", filename))
                        .with_details(vec![e.body_text()])
                })? {
                    size += chunk.len() as u64;
                    if keep {
                        buffer.extend_from_slice(&chunk);
                    }
                }
                received += size;
                files.push(UploadInput::measured(filename, content_type, buffer, size));
            }
            other => tracing::debug!("Ignoring multipart field {:?}", other),
        }
    }

    let outcome = state
        .upload_service
        .upload(session_id.as_deref(), files)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            images: outcome.images,
            total_size_bytes: outcome.total_size_bytes,
            session_id: outcome.session_id,
        }),
    ))
}
