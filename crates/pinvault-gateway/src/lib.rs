//! `pinvault-gateway`: HTTP rate limiting for PinVault services.
//!
//! Puts the limiters from `pinvault-foundation` in front of axum routes:
//!
//! | Piece | Role |
//! |-------|------|
//! | [`middleware::RateLimitGuard`] | Keys the caller and consults one limiter. |
//! | [`middleware::enforce_rate_limit`] | axum middleware: `X-RateLimit-*` headers, `429` on rejection. |
//! | [`server::GatewayServer`] | Builds a [`LimiterRegistry`](pinvault_foundation::LimiterRegistry) from [`config::GatewayConfig`] and serves it. |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use axum::{Router, routing::post};
//! use pinvault_gateway::{config::GatewayConfig, server::GatewayServer};
//! use pinvault_kernel::{RateLimitConfig, RateLimitPolicy};
//!
//! # async fn redeem() -> &'static str { "ok" }
//! # fn main() -> Result<(), pinvault_gateway::error::GatewayError> {
//! let mut config = GatewayConfig::default();
//! config.policies.push(RateLimitPolicy::new(
//!     "redeem",
//!     RateLimitConfig::new(60_000, 5, 500),
//! ));
//!
//! let server = GatewayServer::new(config)?;
//! let routes: Router = server.throttle(
//!     Router::new().route("/v1/pins/redeem", post(redeem)),
//!     "redeem",
//! )?;
//! let app = server.build_app().merge(routes);
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod server;
pub mod state;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use middleware::{RateLimitGuard, enforce_rate_limit};
pub use server::GatewayServer;
