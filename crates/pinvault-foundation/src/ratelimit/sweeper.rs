//! Optional background purge of expired buckets.
//!
//! LRU eviction already bounds memory; the sweeper only returns idle buckets
//! sooner. It holds a weak reference and stops once its target is dropped.

use super::{LimiterRegistry, RateLimiter, SlidingWindowLimiter};
use pinvault_kernel::ratelimit::RateLimit;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Something whose expired buckets can be purged.
pub trait Sweep: Send + Sync {
    /// Purge expired buckets, returning how many were dropped.
    fn sweep(&self) -> usize;
}

impl Sweep for dyn RateLimit {
    fn sweep(&self) -> usize {
        self.purge_expired()
    }
}

impl Sweep for RateLimiter {
    fn sweep(&self) -> usize {
        self.purge_expired()
    }
}

impl Sweep for SlidingWindowLimiter {
    fn sweep(&self) -> usize {
        self.purge_expired()
    }
}

impl Sweep for LimiterRegistry {
    fn sweep(&self) -> usize {
        self.purge_expired()
    }
}

/// Spawn a tokio task that sweeps `target` every `every`.
///
/// Must be called from within a tokio runtime. Abort the returned handle to
/// stop early.
pub fn spawn_sweeper<T>(target: &Arc<T>, every: Duration) -> JoinHandle<()>
where
    T: Sweep + ?Sized + 'static,
{
    let weak: Weak<T> = Arc::downgrade(target);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let Some(target) = weak.upgrade() else {
                debug!("sweep target dropped, stopping sweeper");
                break;
            };

            let purged = target.sweep();
            if purged > 0 {
                debug!(purged, "purged expired rate limit buckets");
            }
        }
    })
}
