use pinvault_kernel::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A clock that only moves when told to.
///
/// Share it with a limiter through `Arc` and advance it between checks to
/// cross window boundaries instantly.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    /// Convenience for the common `Arc<ManualClock>` setup.
    pub fn shared(start_ms: u64) -> Arc<Self> {
        Arc::new(Self::new(start_ms))
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.advance_ms(by.as_millis().try_into().unwrap_or(u64::MAX));
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_only_when_advanced() {
        let clock = ManualClock::new(5_000);
        assert_eq!(clock.now_millis(), 5_000);
        clock.advance_ms(250);
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now_millis(), 6_250);
        clock.set(10);
        assert_eq!(clock.now_millis(), 10);
    }
}
