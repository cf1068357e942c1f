//! HTTP middleware

pub mod rate_limit;

pub use rate_limit::{
    RateLimitGuard, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET,
    apply_rate_limit_headers, enforce_rate_limit,
};
