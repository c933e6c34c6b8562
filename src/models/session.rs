//! Session model
//!
//! A session is the short-lived identity a browser client works under: it owns
//! uploaded images and analysis records, and carries two rate-limit counters.

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of the two per-session budgets an operation is charged against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitKind {
    Requests,
    Tokens,
}

impl RateLimitKind {
    /// The counter that is not `self`
    pub fn other(self) -> Self {
        match self {
            Self::Requests => Self::Tokens,
            Self::Tokens => Self::Requests,
        }
    }
}

impl std::fmt::Display for RateLimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requests => write!(f, "requests"),
            Self::Tokens => write!(f, "tokens"),
        }
    }
}

/// One rate-limit window: `remaining` never exceeds `limit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitCounter {
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitCounter {
    /// A full counter whose window closes at the next minute boundary after `now`
    pub fn full(limit: u64, now: DateTime<Utc>) -> Self {
        Self {
            limit,
            remaining: limit,
            reset_at: next_minute_boundary(now),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.reset_at
    }

    /// Refill the counter and open a new window
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.remaining = self.limit;
        self.reset_at = next_minute_boundary(now);
    }

    /// Whole seconds until the window closes, never less than one
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let secs = (self.reset_at - now).num_milliseconds().max(0) as u64;
        secs.div_ceil(1000).max(1)
    }
}

/// Both counters of a session, serialized as `{requestsPerMinute, tokensPerMinute}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimits {
    pub requests_per_minute: RateLimitCounter,
    pub tokens_per_minute: RateLimitCounter,
}

impl RateLimits {
    pub fn new(requests_limit: u64, tokens_limit: u64, now: DateTime<Utc>) -> Self {
        Self {
            requests_per_minute: RateLimitCounter::full(requests_limit, now),
            tokens_per_minute: RateLimitCounter::full(tokens_limit, now),
        }
    }

    pub fn counter(&self, kind: RateLimitKind) -> &RateLimitCounter {
        match kind {
            RateLimitKind::Requests => &self.requests_per_minute,
            RateLimitKind::Tokens => &self.tokens_per_minute,
        }
    }

    pub fn counter_mut(&mut self, kind: RateLimitKind) -> &mut RateLimitCounter {
        match kind {
            RateLimitKind::Requests => &mut self.requests_per_minute,
            RateLimitKind::Tokens => &mut self.tokens_per_minute,
        }
    }
}

/// Session entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub rate_limits: RateLimits,
}

impl Session {
    /// Create a fresh session with both counters full
    pub fn new(requests_limit: u64, tokens_limit: u64) -> Self {
        Self::new_at(requests_limit, tokens_limit, Utc::now())
    }

    pub fn new_at(requests_limit: u64, tokens_limit: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            rate_limits: RateLimits::new(requests_limit, tokens_limit, now),
        }
    }

    /// A session is expired once strictly more than `ttl` has elapsed since creation
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.created_at > ttl
    }

    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        self.created_at + ttl
    }
}

/// Start of the next whole UTC minute strictly after `now`
pub fn next_minute_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = now
        .duration_trunc(Duration::minutes(1))
        .unwrap_or(now);
    floor + Duration::minutes(1)
}
