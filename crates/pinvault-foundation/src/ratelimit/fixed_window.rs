//! Fixed-window rate limiter
//!
//! Each `(scope, identifier)` bucket holds a request count and the start of its
//! window. The window restarts on the first check at or after
//! `window_start + interval`; a request landing exactly on the boundary belongs
//! to the new window.

use super::table::{BucketKey, BucketTable};
use pinvault_kernel::clock::{Clock, MonotonicClock};
use pinvault_kernel::ratelimit::{
    CheckOptions, RateLimit, RateLimitConfig, RateLimitDecision, RateLimitError, seconds_until,
};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

struct WindowBucket {
    /// Requests admitted in the current window
    count: u32,
    /// When the current window started (clock millis)
    window_start: u64,
}

impl WindowBucket {
    fn new(now: u64) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    fn is_expired(&self, now: u64, interval: u64) -> bool {
        now.saturating_sub(self.window_start) >= interval
    }

    fn roll(&mut self, now: u64, interval: u64) {
        if self.is_expired(now, interval) {
            self.count = 0;
            self.window_start = now;
        }
    }

    fn window_end(&self, interval: u64) -> u64 {
        self.window_start.saturating_add(interval)
    }
}

/// In-memory fixed-window limiter with an LRU-bounded bucket table.
///
/// ```rust
/// use pinvault_foundation::ratelimit::RateLimiter;
/// use pinvault_kernel::{RateLimit, RateLimitConfig};
///
/// let limiter = RateLimiter::new(RateLimitConfig::new(60_000, 3, 100)).unwrap();
/// assert_eq!(limiter.check("1.2.3.4").remaining, 2);
/// assert_eq!(limiter.check("1.2.3.4").remaining, 1);
/// assert_eq!(limiter.check("1.2.3.4").remaining, 0);
/// assert!(!limiter.check("1.2.3.4").success);
/// ```
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: BucketTable<WindowBucket>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter on the monotonic clock.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::InvalidConfig`] if any config field is zero.
    pub fn new(config: RateLimitConfig) -> Result<Self, RateLimitError> {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// Create a limiter reading time from `clock`.
    pub fn with_clock(
        config: RateLimitConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RateLimitError> {
        config.validate()?;
        let capacity = NonZeroUsize::new(config.unique_token_per_interval).ok_or(
            RateLimitError::InvalidConfig {
                field: "unique_token_per_interval",
                reason: "must be greater than zero",
            },
        )?;

        Ok(Self {
            config,
            buckets: BucketTable::new(capacity),
            clock,
        })
    }
}

impl RateLimit for RateLimiter {
    fn check_with(&self, identifier: &str, options: CheckOptions<'_>) -> RateLimitDecision {
        let now = self.clock.now_millis();
        let interval = self.config.interval_ms;
        let limit = options.limit.unwrap_or(self.config.limit);
        let key = BucketKey::new(options.scope, identifier);

        let decision = self.buckets.with_bucket(
            key,
            || WindowBucket::new(now),
            |bucket| {
                bucket.roll(now, interval);
                let reset = seconds_until(now, bucket.window_end(interval));

                if bucket.count >= limit {
                    return RateLimitDecision::rejected(limit, reset);
                }

                bucket.count += 1;
                RateLimitDecision::allowed(limit, limit - bucket.count, reset)
            },
        );

        debug!(
            identifier,
            scope = options.scope,
            success = decision.success,
            remaining = decision.remaining,
            limit = decision.limit,
            "fixed window check"
        );
        decision
    }

    fn peek(&self, identifier: &str, options: CheckOptions<'_>) -> RateLimitDecision {
        let now = self.clock.now_millis();
        let interval = self.config.interval_ms;
        let limit = options.limit.unwrap_or(self.config.limit);
        let fresh = RateLimitDecision::allowed(limit, limit, seconds_until(0, interval));

        self.buckets
            .peek(&BucketKey::new(options.scope, identifier), |bucket| {
                if bucket.is_expired(now, interval) {
                    return fresh;
                }
                RateLimitDecision {
                    success: bucket.count < limit,
                    limit,
                    remaining: limit.saturating_sub(bucket.count),
                    reset: seconds_until(now, bucket.window_end(interval)),
                }
            })
            .unwrap_or(fresh)
    }

    fn reset(&self, identifier: &str, scope: Option<&str>) -> bool {
        self.buckets.remove(&BucketKey::new(scope, identifier))
    }

    fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let interval = self.config.interval_ms;
        self.buckets.retain_live(|bucket| bucket.is_expired(now, interval))
    }

    fn tracked(&self) -> usize {
        self.buckets.len()
    }

    fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}
