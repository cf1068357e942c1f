//! In-memory rate limiting
//!
//! Concrete implementations of the `pinvault_kernel::RateLimit` contract:
//!
//! - **Fixed window** ([`RateLimiter`]): one counter per bucket, reset when the
//!   interval elapses
//! - **Sliding window log** ([`SlidingWindowLimiter`]): per-request timestamps,
//!   smoother at a higher memory cost
//! - **Bounded memory**: every limiter stores its buckets in an LRU table capped
//!   at `unique_token_per_interval` entries
//! - **Key derivation** ([`ClientKeyExtractor`]): address plus optional
//!   user-agent prefix, falling back to `"anonymous"`
//! - **Registry** ([`LimiterRegistry`]): one limiter per named policy
//! - **Sweeper** ([`spawn_sweeper`]): optional background purge of expired buckets
//!
//! # Example
//!
//! ```rust
//! use pinvault_foundation::ratelimit::RateLimiter;
//! use pinvault_kernel::{CheckOptions, RateLimit, RateLimitConfig};
//!
//! let limiter = RateLimiter::new(RateLimitConfig::new(900_000, 5, 500)).unwrap();
//! let decision = limiter.check_with("203.0.113.9", CheckOptions::new().with_scope("login"));
//! assert!(decision.success);
//! assert_eq!(decision.remaining, 4);
//! ```

mod table;

pub mod fixed_window;
pub mod key;
pub mod registry;
pub mod sliding_window;
pub mod sweeper;

pub use fixed_window::RateLimiter;
pub use key::{ClientKeyExtractor, DEFAULT_USER_AGENT_PREFIX_LEN, first_forwarded_for};
pub use registry::{LimiterRegistry, build_limiter};
pub use sliding_window::SlidingWindowLimiter;
pub use sweeper::{Sweep, spawn_sweeper};
