use pinvault_foundation::{LimiterRegistry, spawn_sweeper};
use pinvault_kernel::{CheckOptions, RateLimit, RateLimitConfig, RateLimitPolicy, WindowStrategy};
use pinvault_testing::{ManualClock, RecordingLimiter, fixed_window, sliding_log};
use pinvault_testing::{assert_admitted, assert_checked, assert_rejected};
use std::sync::Arc;
use std::time::Duration;

/// One limiter of each strategy, each on its own manual clock.
fn both(
    interval_ms: u64,
    limit: u32,
    unique_token_per_interval: usize,
) -> Vec<(&'static str, Arc<dyn RateLimit>, Arc<ManualClock>)> {
    let (fixed, fixed_clock) = fixed_window(interval_ms, limit, unique_token_per_interval);
    let (sliding, sliding_clock) = sliding_log(interval_ms, limit, unique_token_per_interval);
    let fixed: Arc<dyn RateLimit> = fixed;
    let sliding: Arc<dyn RateLimit> = sliding;
    vec![
        ("fixed_window", fixed, fixed_clock),
        ("sliding_log", sliding, sliding_clock),
    ]
}

#[test]
fn end_to_end_login_throttling() {
    for (name, limiter, clock) in both(60_000, 3, 100) {
        assert_admitted!(limiter.check("1.2.3.4"), remaining = 2);
        assert_admitted!(limiter.check("1.2.3.4"), remaining = 1);
        assert_admitted!(limiter.check("1.2.3.4"), remaining = 0);

        let rejected = assert_rejected!(limiter.check("1.2.3.4"));
        assert!(rejected.reset <= 60, "{name}: reset {}", rejected.reset);
        assert!(rejected.reset > 0, "{name}: reset {}", rejected.reset);

        clock.advance_ms(60_001);
        let fifth = assert_admitted!(limiter.check("1.2.3.4"), remaining = 2);
        assert_eq!(fifth.limit, 3, "{name}");
    }
}

#[test]
fn admission_decreases_remaining_until_exhausted() {
    for (name, limiter, _clock) in both(10_000, 5, 100) {
        let remaining: Vec<u32> = (0..5)
            .map(|_| assert_admitted!(limiter.check("client")).remaining)
            .collect();
        assert_eq!(remaining, vec![4, 3, 2, 1, 0], "{name}");
        assert_rejected!(limiter.check("client"));
    }
}

#[test]
fn window_rollover_restarts_the_count() {
    for (name, limiter, clock) in both(1_000, 2, 100) {
        limiter.check("client");
        limiter.check("client");
        assert_rejected!(limiter.check("client"));

        clock.advance_ms(1_000);
        let decision = assert_admitted!(limiter.check("client"), remaining = 1);
        assert_eq!(decision.reset, 1, "{name}");
    }
}

#[test]
fn identifiers_do_not_share_budget() {
    for (_name, limiter, _clock) in both(60_000, 2, 100) {
        limiter.check("a");
        limiter.check("a");
        assert_rejected!(limiter.check("a"));

        assert_eq!(limiter.peek("b", CheckOptions::new()).remaining, 2);
        assert_admitted!(limiter.check("b"), remaining = 1);
    }
}

#[test]
fn scopes_do_not_share_budget() {
    for (_name, limiter, _clock) in both(60_000, 1, 100) {
        let login = CheckOptions::new().with_scope("login");
        let redeem = CheckOptions::new().with_scope("redeem");

        assert_admitted!(limiter.check_with("1.2.3.4", login));
        assert_rejected!(limiter.check_with("1.2.3.4", login));
        assert_admitted!(limiter.check_with("1.2.3.4", redeem));
        assert_admitted!(limiter.check("1.2.3.4"));
        assert_eq!(limiter.tracked(), 3);
    }
}

#[test]
fn least_recently_used_bucket_is_evicted_at_capacity() {
    for (name, limiter, _clock) in both(60_000, 2, 3) {
        limiter.check("a");
        limiter.check("a");
        assert_rejected!(limiter.check("a"));

        limiter.check("b");
        limiter.check("c");
        limiter.check("d");
        assert_eq!(limiter.tracked(), 3, "{name}");

        // "a" starts over within the same interval
        assert_admitted!(limiter.check("a"), remaining = 1);
        assert_eq!(limiter.tracked(), 3, "{name}");
        // and "b" made room for it
        assert_eq!(limiter.peek("b", CheckOptions::new()).remaining, 2, "{name}");
    }
}

#[test]
fn remaining_never_underflows() {
    for (_name, limiter, clock) in both(5_000, 3, 4) {
        for step in 0..200u64 {
            let identifier = format!("client-{}", step % 6);
            let options = CheckOptions::new().with_limit((step % 4) as u32);
            let decision = limiter.check_with(&identifier, options);
            assert!(decision.remaining <= decision.limit);
            if !decision.success {
                assert_eq!(decision.remaining, 0);
            }
            clock.advance_ms(137);
        }
    }
}

#[test]
fn reset_counts_down_then_jumps_on_rollover() {
    for (name, limiter, clock) in both(10_000, 100, 10) {
        let mut previous = assert_admitted!(limiter.check("client")).reset;
        assert_eq!(previous, 10, "{name}");

        for _ in 0..9 {
            clock.advance_ms(900);
            let reset = assert_admitted!(limiter.check("client")).reset;
            assert!(reset <= previous, "{name}: {reset} > {previous}");
            previous = reset;
        }
        assert_eq!(previous, 2, "{name}");

        clock.advance_ms(10_000);
        assert_eq!(limiter.check("client").reset, 10, "{name}");
    }
}

#[test]
fn blank_identifiers_share_the_anonymous_bucket() {
    for (_name, limiter, _clock) in both(60_000, 2, 100) {
        limiter.check("");
        limiter.check("   ");
        assert_rejected!(limiter.check("anonymous"));
        assert_eq!(limiter.tracked(), 1);
    }
}

#[test]
fn concurrent_checks_never_over_admit() {
    for (name, limiter, _clock) in both(60_000, 50, 100) {
        let admitted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let limiter = limiter.clone();
                    scope.spawn(move || {
                        (0..25)
                            .filter(|_| limiter.check("shared").success)
                            .count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(admitted, 50, "{name}");
    }
}

#[test]
fn sliding_log_frees_capacity_one_request_at_a_time() {
    let (limiter, clock) = sliding_log(10_000, 2, 10);
    limiter.check("client");
    clock.advance_ms(4_000);
    limiter.check("client");

    assert_rejected!(limiter.check("client"), reset = 6);

    // only the first hit has aged out
    clock.advance_ms(6_000);
    assert_admitted!(limiter.check("client"), remaining = 0);
    assert_rejected!(limiter.check("client"), reset = 4);
}

#[test]
fn recording_limiter_sees_every_check() {
    let (inner, _clock) = fixed_window(60_000, 1, 10);
    let recorder = RecordingLimiter::new(inner);

    recorder.check("a");
    recorder.check_with("a", CheckOptions::new().with_scope("login").with_limit(3));
    assert_rejected!(recorder.check("a"));

    assert_checked!(recorder, 3);
    let history = recorder.history();
    assert_eq!(history[1].scope.as_deref(), Some("login"));
    assert_eq!(history[1].limit, Some(3));
    assert!(!recorder.last().unwrap().decision.success);
}

#[tokio::test(start_paused = true)]
async fn registry_sweeper_purges_idle_buckets_across_policies() {
    let clock = ManualClock::shared(0);
    let policies = [
        RateLimitPolicy::new("login", RateLimitConfig::new(900_000, 5, 500)),
        RateLimitPolicy::new(
            "redeem",
            RateLimitConfig::new(60_000, 10, 500).with_strategy(WindowStrategy::SlidingLog),
        ),
    ];
    let registry = Arc::new(LimiterRegistry::from_policies(&policies, clock.clone()).unwrap());

    let login = registry.get("login").unwrap();
    let redeem = registry.get("redeem").unwrap();
    login.check("1.2.3.4");
    redeem.check("1.2.3.4");
    redeem.check("5.6.7.8");

    let handle = spawn_sweeper(&registry, Duration::from_secs(30));

    // only the shorter window has elapsed
    clock.advance_ms(60_000);
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(redeem.tracked(), 0);
    assert_eq!(login.tracked(), 1);

    clock.advance_ms(900_000);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(login.tracked(), 0);

    handle.abort();
}
