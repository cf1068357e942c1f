// ratelimit module - fixed window and sliding log limiters, registry, sweeper
pub mod ratelimit;

// Re-export rate limiting types
pub use ratelimit::{
    ClientKeyExtractor, LimiterRegistry, RateLimiter, SlidingWindowLimiter, build_limiter,
    spawn_sweeper,
};
