use crate::clock::ManualClock;
use parking_lot::Mutex;
use pinvault_foundation::{RateLimiter, SlidingWindowLimiter};
use pinvault_kernel::{CheckOptions, RateLimit, RateLimitConfig, RateLimitDecision, WindowStrategy};
use std::sync::Arc;

/// A fixed-window limiter driven by a fresh [`ManualClock`].
///
/// Panics on an invalid configuration.
pub fn fixed_window(
    interval_ms: u64,
    limit: u32,
    unique_token_per_interval: usize,
) -> (Arc<RateLimiter>, Arc<ManualClock>) {
    let clock = ManualClock::shared(0);
    let config = RateLimitConfig::new(interval_ms, limit, unique_token_per_interval);
    let limiter = RateLimiter::with_clock(config, clock.clone())
        .unwrap_or_else(|err| panic!("invalid test limiter: {err}"));
    (Arc::new(limiter), clock)
}

/// A sliding-log limiter driven by a fresh [`ManualClock`].
///
/// Panics on an invalid configuration.
pub fn sliding_log(
    interval_ms: u64,
    limit: u32,
    unique_token_per_interval: usize,
) -> (Arc<SlidingWindowLimiter>, Arc<ManualClock>) {
    let clock = ManualClock::shared(0);
    let config = RateLimitConfig::new(interval_ms, limit, unique_token_per_interval)
        .with_strategy(WindowStrategy::SlidingLog);
    let limiter = SlidingWindowLimiter::with_clock(config, clock.clone())
        .unwrap_or_else(|err| panic!("invalid test limiter: {err}"));
    (Arc::new(limiter), clock)
}

/// One call observed by a [`RecordingLimiter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCheck {
    pub identifier: String,
    pub limit: Option<u32>,
    pub scope: Option<String>,
    pub decision: RateLimitDecision,
}

/// Wraps a limiter and records every check passed through it.
///
/// Lets middleware tests assert which identifier and options a request was
/// keyed with, while the inner limiter still makes the real decision.
#[derive(Clone)]
pub struct RecordingLimiter {
    inner: Arc<dyn RateLimit>,
    /// Track all checks passed to this limiter
    pub call_history: Arc<Mutex<Vec<RecordedCheck>>>,
}

impl RecordingLimiter {
    pub fn new(inner: Arc<dyn RateLimit>) -> Self {
        Self {
            inner,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Retrieve the history of checks made against this limiter
    pub fn history(&self) -> Vec<RecordedCheck> {
        self.call_history.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_history.lock().len()
    }

    pub fn last(&self) -> Option<RecordedCheck> {
        self.call_history.lock().last().cloned()
    }
}

impl RateLimit for RecordingLimiter {
    fn check_with(&self, identifier: &str, options: CheckOptions<'_>) -> RateLimitDecision {
        let decision = self.inner.check_with(identifier, options);
        self.call_history.lock().push(RecordedCheck {
            identifier: identifier.to_string(),
            limit: options.limit,
            scope: options.scope.map(str::to_string),
            decision,
        });
        decision
    }

    fn peek(&self, identifier: &str, options: CheckOptions<'_>) -> RateLimitDecision {
        self.inner.peek(identifier, options)
    }

    fn reset(&self, identifier: &str, scope: Option<&str>) -> bool {
        self.inner.reset(identifier, scope)
    }

    fn purge_expired(&self) -> usize {
        self.inner.purge_expired()
    }

    fn tracked(&self) -> usize {
        self.inner.tracked()
    }

    fn config(&self) -> &RateLimitConfig {
        self.inner.config()
    }
}
