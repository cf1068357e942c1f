//! PinVault Testing Framework
//!
//! Deterministic clocks, recording limiters and assertion macros for testing
//! code that sits behind a [`RateLimit`](pinvault_kernel::RateLimit) without
//! sleeping through real windows.

pub mod clock;
pub mod limiter;

pub use clock::ManualClock;
pub use limiter::{RecordedCheck, RecordingLimiter, fixed_window, sliding_log};

/// Assert that a decision admitted the request, optionally checking `remaining`.
#[macro_export]
macro_rules! assert_admitted {
    ($decision:expr) => {{
        let decision = $decision;
        assert!(
            decision.success,
            "expected request to be admitted, got {:?}",
            decision
        );
        decision
    }};
    ($decision:expr, remaining = $remaining:expr) => {{
        let decision = $crate::assert_admitted!($decision);
        assert_eq!(
            decision.remaining, $remaining,
            "unexpected remaining in {:?}",
            decision
        );
        decision
    }};
}

/// Assert that a decision rejected the request, optionally checking `reset`.
#[macro_export]
macro_rules! assert_rejected {
    ($decision:expr) => {{
        let decision = $decision;
        assert!(
            !decision.success,
            "expected request to be rejected, got {:?}",
            decision
        );
        assert_eq!(decision.remaining, 0, "rejections report no remaining budget");
        decision
    }};
    ($decision:expr, reset = $reset:expr) => {{
        let decision = $crate::assert_rejected!($decision);
        assert_eq!(decision.reset, $reset, "unexpected reset in {:?}", decision);
        decision
    }};
}

/// Assert how many checks a [`RecordingLimiter`] has seen.
#[macro_export]
macro_rules! assert_checked {
    ($limiter:expr, $expected_count:expr) => {
        let count = $limiter.call_count();
        assert_eq!(
            count, $expected_count,
            "Expected {} rate limit check(s), but recorded {}",
            $expected_count, count
        );
    };
}
