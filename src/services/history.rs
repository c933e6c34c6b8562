//! History service
//!
//! Read-only views over analysis records: a session's paginated history,
//! single-record lookup and export.

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::models::AnalysisRecord;
use crate::repositories::AnalysisRepository;
use crate::services::export::{self, ExportDocument, ExportFormat};
use crate::services::session::{SessionError, SessionService};
use crate::services::validation::parse_uuid;

/// Error types for history operations
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Invalid session ID format")]
    InvalidSessionId(String),

    #[error("Invalid request ID format")]
    InvalidRequestId(String),

    #[error("Limit must be between 1 and {max}")]
    InvalidLimit { raw: String, max: usize },

    #[error("Invalid export format")]
    InvalidFormat(String),

    #[error("Session not found")]
    SessionNotFound(Uuid),

    #[error("Analysis not found")]
    NotFound(Uuid),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HistoryError {
    pub fn details(&self) -> Vec<String> {
        match self {
            Self::InvalidSessionId(raw) | Self::InvalidRequestId(raw) => {
                vec![format!("'{}' is not a valid UUID", raw)]
            }
            Self::InvalidLimit { raw, .. } => vec![format!("Received limit: {}", raw)],
            Self::InvalidFormat(raw) => {
                vec![format!("'{}' is not one of: json, markdown, txt", raw)]
            }
            _ => Vec::new(),
        }
    }
}

/// One page of a session's history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub session_id: Uuid,
    pub analyses: Vec<AnalysisRecord>,
    pub total_count: usize,
    pub has_more: bool,
}

/// History service
pub struct HistoryService {
    sessions: Arc<SessionService>,
    analyses: Arc<dyn AnalysisRepository>,
    config: AnalysisConfig,
}

impl HistoryService {
    pub fn new(
        sessions: Arc<SessionService>,
        analyses: Arc<dyn AnalysisRepository>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            sessions,
            analyses,
            config,
        }
    }

    /// Newest-first page of a live session's analyses
    pub async fn history(&self, session_id: &str, limit: Option<&str>) -> Result<HistoryPage, HistoryError> {
        let id = parse_uuid(session_id).ok_or_else(|| HistoryError::InvalidSessionId(session_id.to_string()))?;
        let limit = self.parse_limit(limit)?;

        self.sessions.get(id).await.map_err(|e| match e {
            SessionError::NotFound => HistoryError::SessionNotFound(id),
            SessionError::Internal(e) => HistoryError::Internal(e),
        })?;

        let mut records = self.analyses.list_by_session(id).await?;
        let total_count = records.len();
        records.truncate(limit);

        Ok(HistoryPage {
            session_id: id,
            analyses: records,
            total_count,
            has_more: total_count > limit,
        })
    }

    fn parse_limit(&self, raw: Option<&str>) -> Result<usize, HistoryError> {
        let max = self.config.max_history_limit;
        let Some(raw) = raw else {
            return Ok(self.config.default_history_limit);
        };
        match raw.trim().parse::<usize>() {
            Ok(limit) if (1..=max).contains(&limit) => Ok(limit),
            _ => Err(HistoryError::InvalidLimit {
                raw: raw.to_string(),
                max,
            }),
        }
    }

    /// Look up a record by its external request id
    pub async fn get(&self, request_id: &str) -> Result<AnalysisRecord, HistoryError> {
        let id = parse_uuid(request_id).ok_or_else(|| HistoryError::InvalidRequestId(request_id.to_string()))?;
        self.analyses
            .get_by_request_id(id)
            .await?
            .ok_or(HistoryError::NotFound(id))
    }

    /// Render a completed record; anything else is not found
    pub async fn export(&self, request_id: &str, format: Option<&str>) -> Result<ExportDocument, HistoryError> {
        let id = parse_uuid(request_id).ok_or_else(|| HistoryError::InvalidRequestId(request_id.to_string()))?;
        let format = match format {
            Some(raw) => raw
                .parse::<ExportFormat>()
                .map_err(|_| HistoryError::InvalidFormat(raw.to_string()))?,
            None => ExportFormat::default(),
        };

        let record = self
            .analyses
            .get_by_request_id(id)
            .await?
            .ok_or(HistoryError::NotFound(id))?;
        let document = export::render(&record, format)?.ok_or(HistoryError::NotFound(id))?;
        tracing::debug!("Exported analysis {} as {}", id, format);
        Ok(document)
    }
}
