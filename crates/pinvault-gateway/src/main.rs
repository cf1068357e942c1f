//! PinVault gateway entry point.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PINVAULT_CONFIG` | *(none)* | Configuration file (TOML, YAML, JSON, ...). Built-in defaults when unset. |
//! | `PINVAULT_LISTEN_ADDR` | `0.0.0.0:3000` | Socket address to bind. |
//! | `RUST_LOG` | `pinvault_gateway=info` | `tracing` filter directives. |

use eyre::WrapErr;
use pinvault_gateway::{config::GatewayConfig, server::GatewayServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("pinvault_gateway=info"))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = GatewayConfig::from_env().wrap_err("failed to load gateway configuration")?;
    info!(
        listen_addr = %config.listen_addr,
        policies = config.policies.len(),
        "configuration loaded"
    );

    GatewayServer::new(config)
        .wrap_err("invalid rate limit policy")?
        .start()
        .await
        .wrap_err("gateway server stopped")?;
    Ok(())
}
