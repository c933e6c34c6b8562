//! Upload service
//!
//! Validates a multipart batch and stores it in the image repository. Checks
//! run in a fixed order so a malformed request always gets the same error:
//! 1. session exists
//! 2. at least one file
//! 3. file count
//! 4. MIME type of each file
//! 5. total size
//! 6. size of each file
//!
//! Nothing is stored unless every check passes.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::models::{StoredImage, UploadInput, UploadedImageInfo};
use crate::repositories::{ImageRepository, SessionRepository};
use crate::services::validation::parse_uuid;

/// Error types for upload validation
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Session ID is required")]
    MissingSession,

    #[error("Invalid session")]
    InvalidSession(String),

    #[error("No files provided")]
    NoFiles,

    #[error("Maximum {max} images allowed")]
    TooManyFiles { actual: usize, max: usize },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Total upload size exceeds limit")]
    TotalSizeExceeded { actual: u64, max: u64 },

    #[error("{filename} exceeds maximum size limit")]
    FileTooLarge { filename: String, actual: u64, max: u64 },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl UploadError {
    /// Human-readable specifics for the error response
    pub fn details(&self) -> Vec<String> {
        match self {
            Self::MissingSession => vec!["Provide a sessionId form field".to_string()],
            Self::InvalidSession(id) => vec![format!("Session {} not found or expired", id)],
            Self::NoFiles => vec!["Attach at least one image in the images field".to_string()],
            Self::TooManyFiles { actual, max } => {
                vec![format!("Received {} files, maximum is {}", actual, max)]
            }
            Self::UnsupportedFormat(mime) => {
                vec![format!("{} is not one of image/jpeg, image/png, image/webp, image/gif", mime)]
            }
            Self::TotalSizeExceeded { actual, max } => {
                vec![format!("Total size: {} bytes, limit: {} bytes", actual, max)]
            }
            Self::FileTooLarge { actual, max, .. } => {
                vec![format!("File size: {} bytes, limit: {} bytes", actual, max)]
            }
            Self::Internal(_) => Vec::new(),
        }
    }
}

/// Result of a successful upload
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub session_id: Uuid,
    pub images: Vec<UploadedImageInfo>,
    pub total_size_bytes: u64,
}

/// Upload service
pub struct UploadService {
    sessions: Arc<dyn SessionRepository>,
    images: Arc<dyn ImageRepository>,
    config: UploadConfig,
}

impl UploadService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        images: Arc<dyn ImageRepository>,
        config: UploadConfig,
    ) -> Self {
        Self {
            sessions,
            images,
            config,
        }
    }

    /// Validate a batch of files and store it for `session_id`
    pub async fn upload(
        &self,
        session_id: Option<&str>,
        files: Vec<UploadInput>,
    ) -> Result<UploadOutcome, UploadError> {
        let session_id = self.require_session(session_id).await?;
        self.validate_files(&files)?;

        let total_size_bytes = files.iter().map(|f| f.size_bytes).sum();
        let batch: Vec<StoredImage> = files
            .into_iter()
            .map(|file| StoredImage::new(session_id, file))
            .collect();
        let stored = self.images.insert_batch(batch).await?;

        tracing::info!(
            "Stored {} image(s) ({} bytes) for session {}",
            stored.len(),
            total_size_bytes,
            session_id
        );

        Ok(UploadOutcome {
            session_id,
            images: stored.iter().map(|img| UploadedImageInfo::from(img.as_ref())).collect(),
            total_size_bytes,
        })
    }

    async fn require_session(&self, session_id: Option<&str>) -> Result<Uuid, UploadError> {
        let raw = session_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(UploadError::MissingSession)?;
        let id = parse_uuid(raw).ok_or_else(|| UploadError::InvalidSession(raw.to_string()))?;
        match self.sessions.get_by_id(id, Utc::now()).await? {
            Some(_) => Ok(id),
            None => Err(UploadError::InvalidSession(raw.to_string())),
        }
    }

    /// Steps 2 to 6 of the upload pipeline
    pub fn validate_files(&self, files: &[UploadInput]) -> Result<(), UploadError> {
        if files.is_empty() {
            return Err(UploadError::NoFiles);
        }

        if files.len() > self.config.max_files {
            return Err(UploadError::TooManyFiles {
                actual: files.len(),
                max: self.config.max_files,
            });
        }

        if let Some(bad) = files.iter().find(|f| !self.config.is_type_allowed(&f.mime_type)) {
            return Err(UploadError::UnsupportedFormat(bad.mime_type.clone()));
        }

        let total: u64 = files.iter().map(|f| f.size_bytes).sum();
        if total > self.config.max_total_size {
            return Err(UploadError::TotalSizeExceeded {
                actual: total,
                max: self.config.max_total_size,
            });
        }

        if let Some(big) = files.iter().find(|f| f.size_bytes > self.config.max_file_size) {
            return Err(UploadError::FileTooLarge {
                filename: big.filename.clone(),
                actual: big.size_bytes,
                max: self.config.max_file_size,
            });
        }

        Ok(())
    }
}
