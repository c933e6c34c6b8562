//! Session repository
//!
//! This module provides:
//! - `SessionRepository` trait defining the interface for session storage
//! - `MemorySessionRepository`, a `RwLock`-guarded map implementation
//!
//! Rate-limit charges run under the write lock, so two concurrent requests on
//! one session can never both spend the last unit of budget.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{RateLimitKind, Session};
use crate::services::rate_limiter::{RateLimitOutcome, RateLimiter};

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get a live session by ID; expired sessions are reported as missing
    async fn get_by_id(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Session>>;

    /// Charge `amount` against one of the session's counters.
    ///
    /// Returns `None` when the session does not exist or has expired.
    async fn touch_rate_limit(
        &self,
        id: Uuid,
        kind: RateLimitKind,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<Option<RateLimitOutcome>>;

    /// Delete a session, returning whether it existed
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Remove every session older than the TTL and return their IDs
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>>;

    /// Number of stored sessions, live or not yet swept
    async fn count(&self) -> Result<usize>;
}

/// In-memory session repository
pub struct MemorySessionRepository {
    sessions: RwLock<HashMap<Uuid, Session>>,
    ttl: Duration,
}

impl MemorySessionRepository {
    /// Create an empty repository whose sessions live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(ttl: Duration) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(ttl))
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn get_by_id(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&id)
            .filter(|s| !s.is_expired(self.ttl, now))
            .cloned())
    }

    async fn touch_rate_limit(
        &self,
        id: Uuid,
        kind: RateLimitKind,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<Option<RateLimitOutcome>> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(&id) else {
            return Ok(None);
        };
        if session.is_expired(self.ttl, now) {
            return Ok(None);
        }

        let allowed = RateLimiter::check_and_consume(&mut session.rate_limits, kind, amount, now);
        Ok(Some(RateLimitOutcome {
            allowed,
            session: session.clone(),
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(&id).is_some())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let mut sessions = self.sessions.write().await;
        let expired: Vec<Uuid> = sessions
            .values()
            .filter(|s| s.is_expired(self.ttl, now))
            .map(|s| s.id)
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        Ok(expired)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.sessions.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> MemorySessionRepository {
        MemorySessionRepository::new(Duration::hours(1))
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let repo = setup_repo();
        let now = Utc::now();
        let session = Session::new_at(10, 1000, now);

        let created = repo.create(&session).await.unwrap();
        assert_eq!(created.id, session.id);

        let found = repo.get_by_id(session.id, now).await.unwrap().expect("session not found");
        assert_eq!(found.id, session.id);
        assert_eq!(found.rate_limits, session.rate_limits);
    }

    #[tokio::test]
    async fn test_get_unknown_session_is_none() {
        let repo = setup_repo();
        assert!(repo.get_by_id(Uuid::new_v4(), Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_not_found_before_sweep() {
        let repo = setup_repo();
        let created_at = Utc::now() - Duration::hours(2);
        let session = Session::new_at(10, 1000, created_at);
        repo.create(&session).await.unwrap();

        let now = Utc::now();
        assert!(repo.get_by_id(session.id, now).await.unwrap().is_none());
        assert!(repo
            .touch_rate_limit(session.id, RateLimitKind::Requests, 1, now)
            .await
            .unwrap()
            .is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_touch_rate_limit_decrements_and_denies() {
        let repo = setup_repo();
        let now = Utc::now();
        let session = Session::new_at(2, 1000, now);
        repo.create(&session).await.unwrap();

        for expected_remaining in [1, 0] {
            let outcome = repo
                .touch_rate_limit(session.id, RateLimitKind::Requests, 1, now)
                .await
                .unwrap()
                .unwrap();
            assert!(outcome.allowed);
            assert_eq!(outcome.session.rate_limits.requests_per_minute.remaining, expected_remaining);
        }

        let denied = repo
            .touch_rate_limit(session.id, RateLimitKind::Requests, 1, now)
            .await
            .unwrap()
            .unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.session.rate_limits.requests_per_minute.remaining, 0);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_sessions() {
        let repo = setup_repo();
        let now = Utc::now();
        let old = Session::new_at(10, 1000, now - Duration::minutes(61));
        let fresh = Session::new_at(10, 1000, now - Duration::minutes(59));
        repo.create(&old).await.unwrap();
        repo.create(&fresh).await.unwrap();

        let removed = repo.sweep_expired(now).await.unwrap();

        assert_eq!(removed, vec![old.id]);
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.get_by_id(fresh.id, now).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let repo = setup_repo();
        let session = Session::new(10, 1000);
        repo.create(&session).await.unwrap();

        assert!(repo.delete(session.id).await.unwrap());
        assert!(!repo.delete(session.id).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_touches_never_overspend() {
        let repo = Arc::new(setup_repo());
        let now = Utc::now();
        let session = Session::new_at(10, 1000, now);
        repo.create(&session).await.unwrap();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let repo = repo.clone();
                let id = session.id;
                tokio::spawn(async move {
                    repo.touch_rate_limit(id, RateLimitKind::Requests, 1, now)
                        .await
                        .unwrap()
                        .unwrap()
                        .allowed
                })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 10);
    }
}
