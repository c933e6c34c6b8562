//! Common API utilities and shared types

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::api::middleware::ApiError;

/// `?limit=` on the history endpoint; parsed by the service so bad values
/// produce a validation error instead of a query rejection
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<String>,
}

/// `?format=` on the export endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// Unwrap a JSON body, turning extractor rejections into validation errors
pub fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::validation_error("Request body must be valid JSON")
            .with_details(vec![rejection.body_text()])),
    }
}
