//! Clock abstraction (injectable for testing)
//!
//! Limiters read time exclusively through [`Clock`] so window arithmetic can be
//! driven deterministically in tests instead of sleeping.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Provides the current time in milliseconds.
///
/// Only differences between two readings are meaningful to the limiters, so
/// an implementation may count from any fixed origin.
pub trait Clock: Send + Sync {
    /// Returns the current time in milliseconds since the clock's origin.
    fn now_millis(&self) -> u64;
}

/// Wall-clock time as Unix-epoch milliseconds.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX)
    }
}

/// Monotonic time measured from the moment the clock was created.
///
/// This is the default clock for limiters: it never runs backwards when the
/// host adjusts its wall clock.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> u64 {
        self.origin
            .elapsed()
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX)
    }
}
