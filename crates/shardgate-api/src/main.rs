//! ShardGate proxy entry point.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shardgate_api::{serve, ProxyConfig};

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = ProxyConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;

    info!(
        config = %config_path,
        observers = config.observers.len(),
        full_history_nodes = config.full_history_nodes.len(),
        worker_shards = config.num_worker_shards(),
        "starting shardgate proxy"
    );

    serve(config).await
}
