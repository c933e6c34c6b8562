//! Uploaded image model

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// An image accepted by the upload pipeline, held in memory for later analysis
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub buffer: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

impl StoredImage {
    pub fn new(session_id: Uuid, input: UploadInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            original_name: input.filename,
            mime_type: input.mime_type,
            size_bytes: input.size_bytes,
            buffer: input.buffer,
            uploaded_at: Utc::now(),
        }
    }
}

/// One file from a multipart upload, before validation
#[derive(Debug, Clone)]
pub struct UploadInput {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub buffer: Vec<u8>,
}

impl UploadInput {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, buffer: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            size_bytes: buffer.len() as u64,
            buffer,
        }
    }

    /// A file whose size was measured while streaming; `buffer` may be empty
    /// when the batch is already known to fail validation
    pub fn measured(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        buffer: Vec<u8>,
        size_bytes: u64,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            size_bytes,
            buffer,
        }
    }
}

/// Pixel dimensions; always null because the core does not decode images
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageDimensions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Public view of a stored image returned by the upload endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImageInfo {
    pub id: Uuid,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub dimensions: ImageDimensions,
}

impl From<&StoredImage> for UploadedImageInfo {
    fn from(image: &StoredImage) -> Self {
        Self {
            id: image.id,
            original_name: image.original_name.clone(),
            mime_type: image.mime_type.clone(),
            size_bytes: image.size_bytes,
            dimensions: ImageDimensions::default(),
        }
    }
}
