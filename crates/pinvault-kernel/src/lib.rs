//! `pinvault-kernel`: contracts shared by every PinVault crate.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`ratelimit`] | [`RateLimit`] trait, [`RateLimitConfig`], [`CheckOptions`], [`RateLimitDecision`], [`RateLimitError`] |
//! | [`clock`] | [`Clock`] trait with system and monotonic implementations |
//! | [`config`] | Multi-format configuration loader (feature `config`) |
//!
//! Concrete limiters live in `pinvault-foundation`.

// clock module
pub mod clock;

// config module
#[cfg(feature = "config")]
pub mod config;

// ratelimit module
pub mod ratelimit;

pub use clock::{Clock, MonotonicClock, SystemClock};
pub use ratelimit::{
    ANONYMOUS_IDENTIFIER, CheckOptions, RateLimit, RateLimitConfig, RateLimitDecision,
    RateLimitError, RateLimitPolicy, WindowStrategy,
};
