//! Shared application state for the gateway server

use crate::config::GatewayConfig;
use pinvault_foundation::LimiterRegistry;
use std::sync::Arc;

/// State shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// One limiter per configured policy
    pub registry: Arc<LimiterRegistry>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(registry: Arc<LimiterRegistry>, config: Arc<GatewayConfig>) -> Self {
        Self { registry, config }
    }
}
