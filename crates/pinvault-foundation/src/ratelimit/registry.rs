//! Named limiter registry
//!
//! Each call site gets its own limiter, and so its own bucket table. The
//! registry is an ordinary owned value; whatever composes the HTTP routes
//! builds one and hands out `Arc<dyn RateLimit>` by policy name.

use super::{RateLimiter, SlidingWindowLimiter};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use pinvault_kernel::clock::{Clock, MonotonicClock};
use pinvault_kernel::ratelimit::{
    RateLimit, RateLimitConfig, RateLimitError, RateLimitPolicy, WindowStrategy,
};
use std::sync::Arc;
use tracing::info;

/// Build the limiter `config.strategy` asks for.
pub fn build_limiter(
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn RateLimit>, RateLimitError> {
    Ok(match config.strategy {
        WindowStrategy::FixedWindow => Arc::new(RateLimiter::with_clock(config, clock)?),
        WindowStrategy::SlidingLog => Arc::new(SlidingWindowLimiter::with_clock(config, clock)?),
    })
}

pub struct LimiterRegistry {
    limiters: DashMap<String, Arc<dyn RateLimit>>,
    clock: Arc<dyn Clock>,
}

impl LimiterRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock::new()))
    }

    /// Every limiter built by this registry reads time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            limiters: DashMap::new(),
            clock,
        }
    }

    /// Build a registry holding one limiter per policy.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid or duplicate policy.
    pub fn from_policies<'a>(
        policies: impl IntoIterator<Item = &'a RateLimitPolicy>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RateLimitError> {
        let registry = Self::with_clock(clock);
        for policy in policies {
            registry.register(policy)?;
        }
        Ok(registry)
    }

    /// Build and register a limiter for `policy`.
    pub fn register(
        &self,
        policy: &RateLimitPolicy,
    ) -> Result<Arc<dyn RateLimit>, RateLimitError> {
        let limiter = build_limiter(policy.config(), self.clock.clone())?;
        self.insert(&policy.name, limiter.clone())?;
        info!(
            policy = %policy.name,
            interval_ms = policy.interval_ms,
            limit = policy.limit,
            capacity = policy.unique_token_per_interval,
            strategy = ?policy.strategy,
            "registered rate limit policy"
        );
        Ok(limiter)
    }

    /// Register an already-built limiter under `name`.
    pub fn insert(&self, name: &str, limiter: Arc<dyn RateLimit>) -> Result<(), RateLimitError> {
        match self.limiters.entry(name.to_string()) {
            Entry::Occupied(_) => Err(RateLimitError::DuplicatePolicy(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(limiter);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn RateLimit>, RateLimitError> {
        self.limiters
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RateLimitError::UnknownPolicy(name.to_string()))
    }

    /// Registered policy names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.limiters.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }

    /// Purge expired buckets from every registered limiter.
    pub fn purge_expired(&self) -> usize {
        self.limiters
            .iter()
            .map(|entry| entry.value().purge_expired())
            .sum()
    }
}

impl Default for LimiterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
