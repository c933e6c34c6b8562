//! Shared API response types
//!
//! Wire shapes used by more than one endpoint. All fields are camelCase.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{AnalysisRecord, AnalysisStatus, GeneratedImage, RateLimits, Session};

// ============================================================================
// Session Response Types
// ============================================================================

/// Body of `POST /session`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreatedResponse {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub rate_limits: RateLimits,
}

/// Body of `GET /session/{sessionId}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub rate_limits: RateLimits,
}

impl From<Session> for SessionCreatedResponse {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.id,
            created_at: session.created_at,
            rate_limits: session.rate_limits,
        }
    }
}

impl SessionResponse {
    pub fn new(session: Session, ttl: Duration) -> Self {
        Self {
            session_id: session.id,
            created_at: session.created_at,
            expires_at: session.expires_at(ttl),
            rate_limits: session.rate_limits,
        }
    }
}

// ============================================================================
// Analysis Response Types
// ============================================================================

/// A completed analysis, as returned by `/analyze`, `/video` and polling
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub request_id: Uuid,
    pub status: AnalysisStatus,
    pub content: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_images: Option<Vec<GeneratedImage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// Polling body for a record that has no result yet
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAnalysisResponse {
    pub request_id: Uuid,
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion_time: Option<DateTime<Utc>>,
    pub progress_percent: u8,
}

/// Expected provider turnaround used for the polling estimate
const ESTIMATED_ANALYSIS_SECONDS: i64 = 30;

impl AnalysisResponse {
    /// `None` unless the record is completed
    pub fn from_record(record: AnalysisRecord) -> Option<Self> {
        if !record.is_completed() {
            return None;
        }
        let result = record.result?;
        Some(Self {
            id: record.id,
            request_id: record.request_id,
            status: record.status,
            content: result.content,
            format: result.format,
            generated_images: result.generated_images,
            tokens_used: record.tokens_used,
            created_at: record.created_at,
        })
    }
}

impl From<&AnalysisRecord> for PendingAnalysisResponse {
    fn from(record: &AnalysisRecord) -> Self {
        let (progress_percent, estimated_completion_time) = match record.status {
            AnalysisStatus::Pending => (0, Some(record.created_at + Duration::seconds(ESTIMATED_ANALYSIS_SECONDS))),
            AnalysisStatus::Processing => (50, Some(record.created_at + Duration::seconds(ESTIMATED_ANALYSIS_SECONDS))),
            AnalysisStatus::Partial => (75, None),
            AnalysisStatus::Completed | AnalysisStatus::Failed => (100, None),
        };
        Self {
            request_id: record.request_id,
            status: record.status,
            estimated_completion_time,
            progress_percent,
        }
    }
}
