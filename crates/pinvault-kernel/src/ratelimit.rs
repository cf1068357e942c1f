//! Rate limiting kernel contract
//!
//! Trait definitions and value types live here; the concrete limiters live in
//! `pinvault-foundation`. The kernel never depends on foundation.
//!
//! A limiter answers one question per request: may this identifier spend one
//! more request in its current window? The answer is always a
//! [`RateLimitDecision`] value. Rejection is a normal outcome and is never
//! reported through [`RateLimitError`], which only covers misconfiguration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Shared key used when a caller cannot determine a client identifier.
pub const ANONYMOUS_IDENTIFIER: &str = "anonymous";

/// Errors raised while building limiters or looking them up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RateLimitError {
    #[error("invalid rate limit config: `{field}` {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    #[error("rate limit policy already registered: {0}")]
    DuplicatePolicy(String),

    #[error("unknown rate limit policy: {0}")]
    UnknownPolicy(String),
}

/// How a limiter counts requests inside a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStrategy {
    /// One counter per bucket, reset when the window elapses.
    #[default]
    FixedWindow,
    /// A log of admitted timestamps, pruned as they leave the window.
    SlidingLog,
}

/// Limiter configuration, constructed once per call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in milliseconds.
    pub interval_ms: u64,
    /// Default maximum requests per identifier per window.
    pub limit: u32,
    /// Maximum number of buckets tracked at once.
    pub unique_token_per_interval: usize,
    #[serde(default)]
    pub strategy: WindowStrategy,
}

impl RateLimitConfig {
    pub fn new(interval_ms: u64, limit: u32, unique_token_per_interval: usize) -> Self {
        Self {
            interval_ms,
            limit,
            unique_token_per_interval,
            strategy: WindowStrategy::FixedWindow,
        }
    }

    pub fn with_strategy(mut self, strategy: WindowStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Window length as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Reject values that would make the limiter meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::InvalidConfig`] naming the first zero field.
    pub fn validate(&self) -> Result<(), RateLimitError> {
        if self.interval_ms == 0 {
            return Err(RateLimitError::InvalidConfig {
                field: "interval_ms",
                reason: "must be greater than zero",
            });
        }
        if self.limit == 0 {
            return Err(RateLimitError::InvalidConfig {
                field: "limit",
                reason: "must be greater than zero",
            });
        }
        if self.unique_token_per_interval == 0 {
            return Err(RateLimitError::InvalidConfig {
                field: "unique_token_per_interval",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

/// A named [`RateLimitConfig`], as it appears in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub name: String,
    pub interval_ms: u64,
    pub limit: u32,
    pub unique_token_per_interval: usize,
    #[serde(default)]
    pub strategy: WindowStrategy,
}

impl RateLimitPolicy {
    pub fn new(name: impl Into<String>, config: RateLimitConfig) -> Self {
        Self {
            name: name.into(),
            interval_ms: config.interval_ms,
            limit: config.limit,
            unique_token_per_interval: config.unique_token_per_interval,
            strategy: config.strategy,
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        RateLimitConfig {
            interval_ms: self.interval_ms,
            limit: self.limit,
            unique_token_per_interval: self.unique_token_per_interval,
            strategy: self.strategy,
        }
    }
}

/// Per-call adjustments to a check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOptions<'a> {
    /// Overrides the configured limit for this call only.
    pub limit: Option<u32>,
    /// Namespaces the identifier so one limiter can track several endpoints.
    pub scope: Option<&'a str>,
}

impl<'a> CheckOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_scope(mut self, scope: &'a str) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDecision {
    /// Whether the request was admitted.
    pub success: bool,
    /// Effective limit used for this call.
    pub limit: u32,
    /// Requests left in the current window after this call.
    pub remaining: u32,
    /// Whole seconds until the current window ends, rounded up.
    pub reset: u64,
}

impl RateLimitDecision {
    pub fn allowed(limit: u32, remaining: u32, reset: u64) -> Self {
        Self {
            success: true,
            limit,
            remaining,
            reset,
        }
    }

    pub fn rejected(limit: u32, reset: u64) -> Self {
        Self {
            success: false,
            limit,
            remaining: 0,
            reset,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.success
    }

    /// How long a rejected client should wait before retrying.
    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.reset)
    }
}

/// A per-identifier request limiter.
///
/// Implementations must be safe to share between tasks; every method takes
/// `&self` and synchronizes internally.
pub trait RateLimit: Send + Sync {
    /// Record one request for `identifier` and decide whether it is admitted.
    fn check_with(&self, identifier: &str, options: CheckOptions<'_>) -> RateLimitDecision;

    /// [`check_with`](Self::check_with) using the configured limit and no scope.
    fn check(&self, identifier: &str) -> RateLimitDecision {
        self.check_with(identifier, CheckOptions::default())
    }

    /// The decision state a check would observe, without recording anything.
    fn peek(&self, identifier: &str, options: CheckOptions<'_>) -> RateLimitDecision;

    /// Forget one bucket. Returns `true` if it existed.
    fn reset(&self, identifier: &str, scope: Option<&str>) -> bool;

    /// Drop every bucket whose window has fully elapsed. Returns how many were dropped.
    fn purge_expired(&self) -> usize;

    /// Number of buckets currently held.
    fn tracked(&self) -> usize;

    fn config(&self) -> &RateLimitConfig;
}

/// Map blank identifiers onto the shared anonymous bucket.
pub fn normalize_identifier(identifier: &str) -> &str {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        ANONYMOUS_IDENTIFIER
    } else {
        trimmed
    }
}

/// Seconds from `now_ms` until `window_end_ms`, rounded up, zero once passed.
pub fn seconds_until(now_ms: u64, window_end_ms: u64) -> u64 {
    window_end_ms.saturating_sub(now_ms).div_ceil(1000)
}
