//! Sliding-window-log rate limiter
//!
//! Each bucket keeps the timestamps of its admitted requests. A timestamp
//! stops counting once `interval` milliseconds have passed since it was
//! recorded, so capacity frees up one request at a time instead of all at
//! once at a window boundary. Rejected requests are never logged.

use super::table::{BucketKey, BucketTable};
use pinvault_kernel::clock::{Clock, MonotonicClock};
use pinvault_kernel::ratelimit::{
    CheckOptions, RateLimit, RateLimitConfig, RateLimitDecision, RateLimitError, seconds_until,
};
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct LogBucket {
    hits: VecDeque<u64>,
}

impl LogBucket {
    fn prune(&mut self, now: u64, interval: u64) {
        while self
            .hits
            .front()
            .is_some_and(|&hit| now.saturating_sub(hit) >= interval)
        {
            self.hits.pop_front();
        }
    }

    fn live(&self, now: u64, interval: u64) -> usize {
        self.hits
            .iter()
            .filter(|&&hit| now.saturating_sub(hit) < interval)
            .count()
    }

    /// When the oldest live request leaves the window.
    fn frees_at(&self, now: u64, interval: u64) -> u64 {
        self.hits
            .iter()
            .find(|&&hit| now.saturating_sub(hit) < interval)
            .map_or(now, |&hit| hit)
            .saturating_add(interval)
    }
}

fn used(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// In-memory sliding-window-log limiter with an LRU-bounded bucket table.
///
/// Smoother than [`RateLimiter`](super::RateLimiter) at the cost of one
/// timestamp per admitted request per bucket.
pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    buckets: BucketTable<LogBucket>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
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

impl RateLimit for SlidingWindowLimiter {
    fn check_with(&self, identifier: &str, options: CheckOptions<'_>) -> RateLimitDecision {
        let now = self.clock.now_millis();
        let interval = self.config.interval_ms;
        let limit = options.limit.unwrap_or(self.config.limit);
        let key = BucketKey::new(options.scope, identifier);

        let decision = self.buckets.with_bucket(key, LogBucket::default, |bucket| {
            bucket.prune(now, interval);

            if used(bucket.hits.len()) >= limit {
                return RateLimitDecision::rejected(
                    limit,
                    seconds_until(now, bucket.frees_at(now, interval)),
                );
            }

            bucket.hits.push_back(now);
            RateLimitDecision::allowed(
                limit,
                limit.saturating_sub(used(bucket.hits.len())),
                seconds_until(now, bucket.frees_at(now, interval)),
            )
        });

        debug!(
            identifier,
            scope = options.scope,
            success = decision.success,
            remaining = decision.remaining,
            limit = decision.limit,
            "sliding log check"
        );
        decision
    }

    fn peek(&self, identifier: &str, options: CheckOptions<'_>) -> RateLimitDecision {
        let now = self.clock.now_millis();
        let interval = self.config.interval_ms;
        let limit = options.limit.unwrap_or(self.config.limit);

        self.buckets
            .peek(&BucketKey::new(options.scope, identifier), |bucket| {
                let live = used(bucket.live(now, interval));
                RateLimitDecision {
                    success: live < limit,
                    limit,
                    remaining: limit.saturating_sub(live),
                    reset: seconds_until(now, bucket.frees_at(now, interval)),
                }
            })
            .unwrap_or_else(|| RateLimitDecision::allowed(limit, limit, seconds_until(0, interval)))
    }

    fn reset(&self, identifier: &str, scope: Option<&str>) -> bool {
        self.buckets.remove(&BucketKey::new(scope, identifier))
    }

    fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let interval = self.config.interval_ms;
        self.buckets
            .retain_live(|bucket| bucket.live(now, interval) == 0)
    }

    fn tracked(&self) -> usize {
        self.buckets.len()
    }

    fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}
