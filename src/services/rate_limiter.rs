//! Per-session rate limiter
//!
//! Every session carries two fixed-window counters:
//! - requests per minute (charged 1 per analysis request)
//! - tokens per minute (charged with the provider's reported usage)
//!
//! Windows close on whole-minute boundaries. The limiter only mutates the
//! counters it is handed; callers hold the session store's write lock around
//! the call so check-then-decrement is atomic per session.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::models::{RateLimitKind, RateLimits, Session};

/// Result of charging a session
#[derive(Debug, Clone)]
pub struct RateLimitOutcome {
    pub allowed: bool,
    /// Session state after the check (mutated only when allowed or reset)
    pub session: Session,
}

/// Snapshot of one counter used for response headers and 429 bodies
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitSnapshot {
    pub kind: RateLimitKind,
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
    pub retry_after: u64,
    pub limits: RateLimits,
}

impl RateLimitOutcome {
    pub fn snapshot(&self, kind: RateLimitKind, now: DateTime<Utc>) -> RateLimitSnapshot {
        let counter = self.session.rate_limits.counter(kind);
        RateLimitSnapshot {
            kind,
            limit: counter.limit,
            remaining: counter.remaining,
            reset_at: counter.reset_at,
            retry_after: counter.retry_after_secs(now),
            limits: self.session.rate_limits.clone(),
        }
    }
}

/// Session rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    requests_per_minute: u64,
    tokens_per_minute: u64,
}

impl RateLimiter {
    /// Create a limiter with the given per-minute limits
    pub fn new(requests_per_minute: u64, tokens_per_minute: u64) -> Self {
        Self {
            requests_per_minute,
            tokens_per_minute,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_minute, config.tokens_per_minute)
    }

    /// Counters for a brand new session
    pub fn fresh_limits(&self, now: DateTime<Utc>) -> RateLimits {
        RateLimits::new(self.requests_per_minute, self.tokens_per_minute, now)
    }

    /// Create a new session with full counters
    pub fn new_session(&self, now: DateTime<Utc>) -> Session {
        Session::new_at(self.requests_per_minute, self.tokens_per_minute, now)
    }

    /// Charge `amount` against `kind`, resetting expired windows first.
    ///
    /// Returns `true` and decrements when `remaining >= amount`; otherwise
    /// returns `false` and leaves `remaining` untouched.
    pub fn check_and_consume(
        limits: &mut RateLimits,
        kind: RateLimitKind,
        amount: u64,
        now: DateTime<Utc>,
    ) -> bool {
        if limits.counter(kind).is_expired(now) {
            limits.counter_mut(kind).reset(now);
            // Both windows share a visible cadence: an expired sibling resets too
            let other = kind.other();
            if limits.counter(other).is_expired(now) {
                limits.counter_mut(other).reset(now);
            }
        }

        let counter = limits.counter_mut(kind);
        if counter.remaining >= amount {
            counter.remaining -= amount;
            true
        } else {
            false
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}
