//! Gateway error types

use crate::middleware::apply_rate_limit_headers;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pinvault_kernel::config::ConfigError;
use pinvault_kernel::{RateLimitDecision, RateLimitError};
use serde_json::json;
use thiserror::Error;

/// Gateway-level errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("rate limit exceeded for client {client}")]
    RateLimited {
        client: String,
        decision: RateLimitDecision,
    },

    #[error(transparent)]
    RateLimit(#[from] RateLimitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot throttle a router with no routes")]
    EmptyRouter,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            GatewayError::RateLimited { decision, .. } => {
                return rate_limited_response(decision);
            }
            GatewayError::RateLimit(err) => ("RATE_LIMIT_CONFIG", err.to_string()),
            GatewayError::Config(err) => ("CONFIG_ERROR", err.to_string()),
            GatewayError::EmptyRouter => ("EMPTY_ROUTER", self.to_string()),
            GatewayError::Io(err) => ("IO_ERROR", err.to_string()),
            GatewayError::Internal(msg) => ("INTERNAL_ERROR", msg.clone()),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// `429 Too Many Requests` carrying the decision as headers and JSON body.
fn rate_limited_response(decision: &RateLimitDecision) -> Response {
    let body = Json(json!({
        "error": {
            "code": "RATE_LIMIT_EXCEEDED",
            "message": format!("Too many requests. Retry after {} second(s).", decision.reset),
            "retry_after": decision.reset,
        }
    }));

    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    apply_rate_limit_headers(response.headers_mut(), decision);
    response
}

pub type GatewayResult<T> = Result<T, GatewayError>;
