//! Per-client rate limiting middleware
//!
//! Wraps a [`RateLimit`] implementation as an axum middleware. Admitted
//! requests pass through with `X-RateLimit-*` headers attached to the response;
//! rejected requests short-circuit with `429 Too Many Requests`.

use crate::error::GatewayError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{RETRY_AFTER, USER_AGENT},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use pinvault_foundation::ratelimit::{ClientKeyExtractor, first_forwarded_for};
use pinvault_kernel::{CheckOptions, RateLimit, RateLimitDecision};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Write `decision` as `X-RateLimit-*` headers, plus `Retry-After` on rejection.
pub fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset));
    if !decision.success {
        headers.insert(RETRY_AFTER, HeaderValue::from(decision.reset));
    }
}

/// Middleware state: which limiter to consult and how to key the caller.
#[derive(Clone)]
pub struct RateLimitGuard {
    limiter: Arc<dyn RateLimit>,
    scope: Option<Arc<str>>,
    limit: Option<u32>,
    keys: ClientKeyExtractor,
    trust_forwarded_headers: bool,
}

impl RateLimitGuard {
    pub fn new(limiter: Arc<dyn RateLimit>) -> Self {
        Self {
            limiter,
            scope: None,
            limit: None,
            keys: ClientKeyExtractor::default(),
            trust_forwarded_headers: false,
        }
    }

    /// Track callers under `scope` so a shared limiter counts this route separately.
    pub fn with_scope(mut self, scope: impl Into<Arc<str>>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Override the limiter's configured limit for requests through this guard.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_key_extractor(mut self, keys: ClientKeyExtractor) -> Self {
        self.keys = keys;
        self
    }

    /// Whether `X-Forwarded-For` / `X-Real-IP` may name the client.
    ///
    /// Off by default. Enable only behind a proxy that overwrites these
    /// headers; otherwise every request can pick its own bucket.
    pub fn trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }

    fn options(&self) -> CheckOptions<'_> {
        CheckOptions {
            limit: self.limit,
            scope: self.scope.as_deref(),
        }
    }

    fn client_ip(&self, request: &Request) -> Option<String> {
        let headers = request.headers();
        if self.trust_forwarded_headers {
            let forwarded = headers
                .get(X_FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
                .and_then(first_forwarded_for);
            let real_ip = headers
                .get(X_REAL_IP)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|ip| !ip.is_empty());

            if let Some(ip) = forwarded.or(real_ip) {
                return Some(ip.to_string());
            }
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    }

    /// The limiter identifier for `request`.
    pub fn client_key(&self, request: &Request) -> String {
        let user_agent = request
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok());
        self.keys
            .extract_key(self.client_ip(request).as_deref(), user_agent)
    }

    /// Record `request` against the limiter.
    pub fn check(&self, request: &Request) -> (String, RateLimitDecision) {
        let client = self.client_key(request);
        let decision = self.limiter.check_with(&client, self.options());
        (client, decision)
    }
}

/// axum middleware enforcing a [`RateLimitGuard`].
///
/// Attach with `axum::middleware::from_fn_with_state(guard, enforce_rate_limit)`.
pub async fn enforce_rate_limit(
    State(guard): State<RateLimitGuard>,
    request: Request,
    next: Next,
) -> Response {
    let (client, decision) = guard.check(&request);

    if !decision.success {
        warn!(
            client = %client,
            scope = guard.scope.as_deref(),
            limit = decision.limit,
            retry_after = decision.reset,
            path = %request.uri().path(),
            "rate limit exceeded"
        );
        return GatewayError::RateLimited { client, decision }.into_response();
    }

    let mut response = next.run(request).await;
    apply_rate_limit_headers(response.headers_mut(), &decision);
    response
}
