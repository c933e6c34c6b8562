//! Session service
//!
//! Creates sessions, charges their rate limits and sweeps expired ones. The
//! sweep and explicit deletion evict a session's images and analysis records
//! together with it.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{RateLimitKind, Session};
use crate::repositories::{AnalysisRepository, ImageRepository, SessionRepository};
use crate::services::rate_limiter::{RateLimitOutcome, RateLimiter};

/// Error types for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// What one sweep removed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions: usize,
    pub images: usize,
    pub analyses: usize,
}

/// Session service
pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
    images: Arc<dyn ImageRepository>,
    analyses: Arc<dyn AnalysisRepository>,
    limiter: RateLimiter,
    ttl: Duration,
}

impl SessionService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        images: Arc<dyn ImageRepository>,
        analyses: Arc<dyn AnalysisRepository>,
        limiter: RateLimiter,
        ttl: Duration,
    ) -> Self {
        Self {
            sessions,
            images,
            analyses,
            limiter,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a session with full rate-limit counters
    pub async fn create(&self) -> Result<Session, SessionError> {
        let session = self.limiter.new_session(Utc::now());
        let session = self.sessions.create(&session).await?;
        tracing::info!("Created session {}", session.id);
        Ok(session)
    }

    /// Get a live session
    pub async fn get(&self, id: Uuid) -> Result<Session, SessionError> {
        self.sessions
            .get_by_id(id, Utc::now())
            .await?
            .ok_or(SessionError::NotFound)
    }

    /// Charge a session's counter now
    pub async fn touch_rate_limit(
        &self,
        id: Uuid,
        kind: RateLimitKind,
        amount: u64,
    ) -> Result<RateLimitOutcome, SessionError> {
        self.touch_rate_limit_at(id, kind, amount, Utc::now()).await
    }

    pub async fn touch_rate_limit_at(
        &self,
        id: Uuid,
        kind: RateLimitKind,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<RateLimitOutcome, SessionError> {
        let outcome = self
            .sessions
            .touch_rate_limit(id, kind, amount, now)
            .await?
            .ok_or(SessionError::NotFound)?;
        if !outcome.allowed {
            tracing::debug!("Session {} over {} limit", id, kind);
        }
        Ok(outcome)
    }

    /// End a live session now and evict everything it owns
    pub async fn delete(&self, id: Uuid) -> Result<SweepReport, SessionError> {
        self.get(id).await?;
        if !self.sessions.delete(id).await? {
            return Err(SessionError::NotFound);
        }
        let (images, analyses) = self.evict(id).await?;
        tracing::info!(
            "Deleted session {} with {} image(s), {} analysis record(s)",
            id,
            images,
            analyses
        );
        Ok(SweepReport {
            sessions: 1,
            images,
            analyses,
        })
    }

    /// Remove expired sessions and everything they own
    ///
    /// Images and records whose session is no longer live are evicted too,
    /// which covers data stored by a request that finished after its session
    /// was swept. A failed eviction is logged and retried on the next sweep.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<SweepReport, SessionError> {
        let expired = self.sessions.sweep_expired(now).await?;
        let mut report = SweepReport {
            sessions: expired.len(),
            ..Default::default()
        };

        let (image_owners, analysis_owners) =
            futures::join!(self.images.session_ids(), self.analyses.session_ids());
        let mut owners: HashSet<Uuid> = expired.into_iter().collect();
        owners.extend(image_owners?);
        owners.extend(analysis_owners?);

        for id in owners {
            match self.sessions.get_by_id(id, now).await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Failed to check session {} during sweep: {:#}", id, e);
                    continue;
                }
            }
            match self.evict(id).await {
                Ok((images, analyses)) => {
                    report.images += images;
                    report.analyses += analyses;
                }
                Err(e) => tracing::warn!("Failed to evict data of session {}: {:#}", id, e),
            }
        }

        if report != SweepReport::default() {
            tracing::info!(
                "Swept {} expired session(s), {} image(s), {} analysis record(s)",
                report.sessions,
                report.images,
                report.analyses
            );
        }
        Ok(report)
    }

    async fn evict(&self, id: Uuid) -> anyhow::Result<(usize, usize)> {
        let (images, analyses) = futures::join!(
            self.images.delete_by_session(id),
            self.analyses.delete_by_session(id)
        );
        Ok((images?, analyses?))
    }
}
