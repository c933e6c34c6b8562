//! Analysis record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Analysis status
///
/// Only `Completed` is produced today: the pipeline awaits the provider before
/// a record exists. The other states are part of the wire schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Partial,
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Partial => write!(f, "partial"),
        }
    }
}

impl std::str::FromStr for AnalysisStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "partial" => Ok(Self::Partial),
            _ => Err(anyhow::anyhow!("Invalid analysis status: {}", s)),
        }
    }
}

/// What produced the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Analysis,
    Video,
}

/// An image returned by the provider, base64 encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: String,
}

/// Provider output attached to a completed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub content: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_images: Option<Vec<GeneratedImage>>,
}

/// Stored result of one prompt + images request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub request_id: Uuid,
    pub session_id: Uuid,
    pub image_ids: Vec<Uuid>,
    pub prompt: String,
    pub kind: AnalysisKind,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
}

impl AnalysisRecord {
    /// Build a completed record; the only way a record carries a result
    pub fn completed(
        session_id: Uuid,
        image_ids: Vec<Uuid>,
        prompt: String,
        kind: AnalysisKind,
        result: AnalysisResult,
        tokens_used: Option<u64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id: Uuid::new_v4(),
            session_id,
            image_ids,
            prompt,
            kind,
            status: AnalysisStatus::Completed,
            created_at: Utc::now(),
            result: Some(result),
            tokens_used,
        }
    }

    /// Build a record without a result in a non-terminal or failed state
    pub fn without_result(
        session_id: Uuid,
        image_ids: Vec<Uuid>,
        prompt: String,
        kind: AnalysisKind,
        status: AnalysisStatus,
    ) -> Self {
        debug_assert!(status != AnalysisStatus::Completed);
        Self {
            id: Uuid::new_v4(),
            request_id: Uuid::new_v4(),
            session_id,
            image_ids,
            prompt,
            kind,
            status,
            created_at: Utc::now(),
            result: None,
            tokens_used: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == AnalysisStatus::Completed && self.result.is_some()
    }
}
