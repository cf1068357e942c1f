//! Axum-based HTTP gateway server.
//!
//! [`GatewayServer`] owns the limiter registry built from [`GatewayConfig`] and
//! hands out [`RateLimitGuard`]s so composing applications can throttle their
//! own routes by policy name.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness check, never throttled. |
//! | `GET`  | `/v1/limits` | Configured policies with their tracked bucket counts. |

use crate::config::{DEFAULT_POLICY, GatewayConfig};
use crate::error::{GatewayError, GatewayResult};
use crate::middleware::{RateLimitGuard, enforce_rate_limit};
use crate::state::AppState;
use axum::{Json, Router, extract::State, middleware, response::IntoResponse, routing::get};
use pinvault_foundation::{LimiterRegistry, spawn_sweeper};
use pinvault_kernel::clock::{Clock, MonotonicClock};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub struct GatewayServer {
    config: Arc<GatewayConfig>,
    registry: Arc<LimiterRegistry>,
}

impl GatewayServer {
    /// Build the registry for every configured policy.
    ///
    /// # Errors
    ///
    /// Fails if a policy is invalid or two policies share a name.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(config: GatewayConfig, clock: Arc<dyn Clock>) -> GatewayResult<Self> {
        let registry = LimiterRegistry::from_policies(&config.policies, clock)?;
        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        })
    }

    pub fn registry(&self) -> &Arc<LimiterRegistry> {
        &self.registry
    }

    /// A guard for `policy`, keyed the way the configuration asks.
    pub fn guard(&self, policy: &str) -> GatewayResult<RateLimitGuard> {
        let limiter = self.registry.get(policy)?;
        Ok(RateLimitGuard::new(limiter)
            .with_key_extractor(self.config.key_extractor())
            .trust_forwarded_headers(self.config.trust_forwarded_headers))
    }

    /// Throttle every route currently in `router` with `guard`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EmptyRouter`] if `router` has no routes yet;
    /// routes added afterwards would not be guarded.
    pub fn throttle_with<S>(router: Router<S>, guard: RateLimitGuard) -> GatewayResult<Router<S>>
    where
        S: Clone + Send + Sync + 'static,
    {
        if !router.has_routes() {
            return Err(GatewayError::EmptyRouter);
        }
        Ok(guarded(router, guard))
    }

    /// Throttle every route currently in `router` with the named policy.
    pub fn throttle<S>(&self, router: Router<S>, policy: &str) -> GatewayResult<Router<S>>
    where
        S: Clone + Send + Sync + 'static,
    {
        Self::throttle_with(router, self.guard(policy)?)
    }

    /// Build the gateway's own router.
    ///
    /// `/v1/limits` is throttled by the `default` policy when one is configured.
    pub fn build_app(&self) -> Router {
        let mut api = Router::new().route("/v1/limits", get(list_limits_handler));
        if let Ok(guard) = self.guard(DEFAULT_POLICY) {
            api = guarded(api, guard);
        }

        Router::new()
            .route("/health", get(health_handler))
            .merge(api)
            .with_state(AppState::new(self.registry.clone(), self.config.clone()))
    }

    /// Bind to the configured address and serve until the process exits.
    pub async fn start(self) -> GatewayResult<()> {
        let app = self.build_app();

        let sweeper = self
            .config
            .sweep_interval()
            .map(|every| spawn_sweeper(&self.registry, every));

        let listener = tokio::net::TcpListener::bind(&self.config.listen_addr).await?;
        info!(
            addr = %self.config.listen_addr,
            policies = ?self.registry.names(),
            "PinVault gateway starting"
        );

        let served = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;

        if let Some(handle) = sweeper {
            handle.abort();
        }
        served.map_err(GatewayError::from)
    }
}

fn guarded<S>(router: Router<S>, guard: RateLimitGuard) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(guard, enforce_rate_limit))
}

/// `GET /health`: liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "pinvault-gateway" }))
}

/// `GET /v1/limits`: configured policies and how many buckets each holds.
async fn list_limits_handler(State(state): State<AppState>) -> impl IntoResponse {
    let policies: Vec<serde_json::Value> = state
        .config
        .policies
        .iter()
        .map(|policy| {
            let tracked = state
                .registry
                .get(&policy.name)
                .map(|limiter| limiter.tracked())
                .unwrap_or(0);
            json!({
                "name": policy.name,
                "interval_ms": policy.interval_ms,
                "limit": policy.limit,
                "unique_token_per_interval": policy.unique_token_per_interval,
                "strategy": policy.strategy,
                "tracked": tracked,
            })
        })
        .collect();
    Json(json!({ "policies": policies }))
}
