//! Gateway configuration
//!
//! Loaded from the file named by `PINVAULT_CONFIG` (any format the kernel
//! loader understands), with `PINVAULT_*` environment variables overriding
//! top-level keys. Without a file the built-in defaults apply.

use crate::error::GatewayResult;
use pinvault_foundation::ratelimit::{ClientKeyExtractor, DEFAULT_USER_AGENT_PREFIX_LEN};
use pinvault_kernel::config::load_with_env;
use pinvault_kernel::{RateLimitConfig, RateLimitPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "PINVAULT_CONFIG";
/// Prefix for environment overrides (`PINVAULT_LISTEN_ADDR`, ...).
pub const ENV_PREFIX: &str = "PINVAULT";
/// Policy guarding the gateway's own API routes.
pub const DEFAULT_POLICY: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Socket address to bind (default: `0.0.0.0:3000`).
    pub listen_addr: String,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    ///
    /// Off by default: any client can set these headers, so enable it only
    /// when a trusted proxy in front of the gateway overwrites them.
    pub trust_forwarded_headers: bool,
    /// User-agent characters appended to the client address; `0` disables.
    pub user_agent_prefix_len: usize,
    /// Background purge period for expired buckets; `None` relies on LRU eviction alone.
    pub sweep_interval_ms: Option<u64>,
    pub policies: Vec<RateLimitPolicy>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            trust_forwarded_headers: false,
            user_agent_prefix_len: DEFAULT_USER_AGENT_PREFIX_LEN,
            sweep_interval_ms: Some(60_000),
            policies: vec![RateLimitPolicy::new(
                DEFAULT_POLICY,
                RateLimitConfig::new(60_000, 30, 500),
            )],
        }
    }
}

impl GatewayConfig {
    /// Load from `path`, applying `PINVAULT_*` overrides.
    pub fn load(path: impl AsRef<Path>) -> GatewayResult<Self> {
        Ok(load_with_env(path, ENV_PREFIX)?)
    }

    /// Load from `$PINVAULT_CONFIG` if set, otherwise use defaults.
    ///
    /// `PINVAULT_LISTEN_ADDR` overrides the listen address either way.
    pub fn from_env() -> GatewayResult<Self> {
        Self::from_env_vars(CONFIG_PATH_ENV, ENV_PREFIX)
    }

    fn from_env_vars(path_var: &str, prefix: &str) -> GatewayResult<Self> {
        if let Ok(path) = std::env::var(path_var) {
            return Ok(load_with_env(path, prefix)?);
        }

        let mut config = Self::default();
        if let Ok(addr) = std::env::var(format!("{prefix}_LISTEN_ADDR")) {
            config.listen_addr = addr;
        }
        Ok(config)
    }

    pub fn key_extractor(&self) -> ClientKeyExtractor {
        ClientKeyExtractor::with_user_agent_prefix(self.user_agent_prefix_len)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}
