//! API middleware
//!
//! Contains:
//! - Application state shared by every handler
//! - The single API error type and its wire shape
//! - Request statistics middleware
//! - Rate-limit response headers

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::models::RateLimits;
use crate::provider::AnalysisProvider;
use crate::repositories::{MemoryAnalysisRepository, MemoryImageRepository, MemorySessionRepository};
use crate::services::analysis::{AnalysisError, AnalysisService};
use crate::services::history::{HistoryError, HistoryService};
use crate::services::rate_limiter::{RateLimitSnapshot, RateLimiter};
use crate::services::session::{SessionError, SessionService};
use crate::services::upload::{UploadError, UploadService};

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    total_requests: AtomicU64,
    /// Total response time in microseconds (for calculating average)
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a request with its response time
    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us.fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Average response time in milliseconds
    pub fn avg_response_time_ms(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64 / 1000.0
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Request stats middleware; wraps every request
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    state.request_stats.record(start.elapsed().as_micros() as u64);
    response
}

// ============================================================================
// Application State
// ============================================================================

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session_service: Arc<SessionService>,
    pub upload_service: Arc<UploadService>,
    pub analysis_service: Arc<AnalysisService>,
    pub history_service: Arc<HistoryService>,
    pub request_stats: Arc<RequestStats>,
}

impl AppState {
    /// Wire in-memory stores and services around a provider
    pub fn new(config: Config, provider: Arc<dyn AnalysisProvider>) -> Self {
        let ttl = config.session.ttl();
        let session_repo = MemorySessionRepository::boxed(ttl);
        let image_repo = MemoryImageRepository::boxed();
        let analysis_repo = MemoryAnalysisRepository::boxed();

        let session_service = Arc::new(SessionService::new(
            session_repo.clone(),
            image_repo.clone(),
            analysis_repo.clone(),
            RateLimiter::from_config(&config.rate_limit),
            ttl,
        ));
        let upload_service = Arc::new(UploadService::new(
            session_repo,
            image_repo.clone(),
            config.upload.clone(),
        ));
        let analysis_service = Arc::new(AnalysisService::new(
            session_service.clone(),
            image_repo,
            analysis_repo.clone(),
            provider,
            config.analysis.clone(),
        ));
        let history_service = Arc::new(HistoryService::new(
            session_service.clone(),
            analysis_repo,
            config.analysis.clone(),
        ));

        Self {
            config: Arc::new(config),
            session_service,
            upload_service,
            analysis_service,
            history_service,
            request_stats: Arc::new(RequestStats::new()),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

pub const VALIDATION_ERROR: &str = "validation_error";
pub const RATE_LIMIT_EXCEEDED: &str = "rate_limit_exceeded";
pub const NOT_FOUND: &str = "not_found";
pub const INTERNAL_ERROR: &str = "internal_error";

/// Error response for API errors
///
/// `{error, message, details?}`; rate-limit errors add
/// `retryAfter`, `limits` and `timestamp`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<RateLimits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip)]
    rate_limit: Option<RateLimitSnapshot>,
}

impl ApiError {
    pub fn new(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            details: None,
            retry_after: None,
            limits: None,
            timestamp: None,
            rate_limit: None,
        }
    }

    /// Attach details; an empty list is omitted from the body
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        if !details.is_empty() {
            self.details = Some(details);
        }
        self
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(VALIDATION_ERROR, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(NOT_FOUND, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    pub fn rate_limited(snapshot: RateLimitSnapshot) -> Self {
        Self {
            retry_after: Some(snapshot.retry_after),
            limits: Some(snapshot.limits.clone()),
            timestamp: Some(Utc::now()),
            rate_limit: Some(snapshot),
            ..Self::new(RATE_LIMIT_EXCEEDED, "Rate limit exceeded")
        }
        .with_details(vec!["Too many requests, please try again later".to_string()])
    }

    pub fn status(&self) -> StatusCode {
        match self.error {
            VALIDATION_ERROR => StatusCode::BAD_REQUEST,
            RATE_LIMIT_EXCEEDED => StatusCode::TOO_MANY_REQUESTS,
            NOT_FOUND => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log the cause and hide it from the client
    fn internal(context: &str, cause: impl std::fmt::Display) -> Self {
        tracing::error!("{}: {}", context, cause);
        Self::internal_error(context)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let headers = self
            .rate_limit
            .as_ref()
            .map(rate_limit_headers)
            .unwrap_or_default();
        (status, headers, Json(self)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => ApiError::not_found("Session not found"),
            SessionError::Internal(e) => ApiError::internal("Session store failure", e),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Internal(e) => ApiError::internal("Failed to store images", e),
            other => ApiError::validation_error(other.to_string()).with_details(other.details()),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::RateLimited(snapshot) => ApiError::rate_limited(snapshot),
            AnalysisError::Provider(e) => ApiError::internal("Analysis provider request failed", e),
            AnalysisError::Internal(e) => ApiError::internal("Failed to process analysis request", e),
            other => ApiError::validation_error(other.to_string()).with_details(other.details()),
        }
    }
}

impl From<HistoryError> for ApiError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::SessionNotFound(_) | HistoryError::NotFound(_) => {
                ApiError::not_found(err.to_string())
            }
            HistoryError::Internal(e) => ApiError::internal("Failed to read analysis records", e),
            other => ApiError::validation_error(other.to_string()).with_details(other.details()),
        }
    }
}

// ============================================================================
// Rate-limit headers
// ============================================================================

pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// `X-RateLimit-*` headers for a counter snapshot; reset is in unix seconds
pub fn rate_limit_headers(snapshot: &RateLimitSnapshot) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let values = [
        (X_RATELIMIT_LIMIT, snapshot.limit.to_string()),
        (X_RATELIMIT_REMAINING, snapshot.remaining.to_string()),
        (X_RATELIMIT_RESET, snapshot.reset_at.timestamp().to_string()),
    ];
    for (name, value) in values {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
    headers
}
