//! Processor wiring and the serve loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use shardgate_process::adapters::{
    hasher_from_id, marshalizer_from_id, Bech32PubkeyConverter, EventLogsMerger,
};
use shardgate_process::{
    observer_tx_cost_factory, BaseProcessor, EsdtSupplyProcessor, HttpClient, MetricsCache,
    NodeStatusProcessor, ObserverRegistry, ProcessError, Processor, PubkeyConverter,
    ScQueryProcessor, ScQueryService, ShardCoordinator, TransactionProcessor,
};
use tracing::info;

use crate::config::ProxyConfig;
use crate::router::build_router;

/// Shared handle to every processor, cloned into each request task.
#[derive(Clone)]
pub struct AppState {
    /// Cluster metric views.
    pub node_status: Arc<NodeStatusProcessor>,
    /// Transaction operations.
    pub transactions: Arc<TransactionProcessor>,
    /// Token supply aggregation.
    pub esdt_supply: Arc<EsdtSupplyProcessor>,
    /// Read-only VM queries.
    pub sc_query: Arc<ScQueryProcessor>,
}

impl AppState {
    /// Build every processor over an already-wired base processor.
    pub fn from_parts(
        proc: Arc<dyn Processor>,
        pubkey_converter: Arc<dyn PubkeyConverter>,
        hasher_id: &str,
        marshalizer_id: &str,
        metrics_cache_ttl: Duration,
        allow_entire_pool_fetch: bool,
    ) -> Result<Self, ProcessError> {
        let hasher = hasher_from_id(hasher_id)?;
        let marshalizer = marshalizer_from_id(marshalizer_id)?;
        let logs_merger = Arc::new(EventLogsMerger::new(
            Arc::clone(&marshalizer),
            Arc::clone(&hasher),
        ));

        let node_status = Arc::new(NodeStatusProcessor::new(
            Arc::clone(&proc),
            Arc::new(MetricsCache::new()),
            metrics_cache_ttl,
        )?);

        let sc_query = Arc::new(ScQueryProcessor::new(
            Arc::clone(&proc),
            Arc::clone(&pubkey_converter),
        ));

        let cost_factory =
            observer_tx_cost_factory(Arc::clone(&proc), Arc::clone(&pubkey_converter));
        let transactions = Arc::new(TransactionProcessor::new(
            Arc::clone(&proc),
            pubkey_converter,
            hasher,
            marshalizer,
            cost_factory,
            logs_merger,
            allow_entire_pool_fetch,
        ));

        let sc_query_service: Arc<dyn ScQueryService> = sc_query.clone();
        let esdt_supply = Arc::new(EsdtSupplyProcessor::new(proc, sc_query_service));

        Ok(Self {
            node_status,
            transactions,
            esdt_supply,
            sc_query,
        })
    }

    /// Build the full state from a validated configuration.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ProcessError> {
        let registry =
            ObserverRegistry::new(config.observer_nodes(), config.full_history_node_list())?;
        let coordinator = ShardCoordinator::new(config.num_worker_shards())?;
        let client = HttpClient::new(Duration::from_secs(config.server.request_timeout_secs))?;
        let proc: Arc<dyn Processor> = Arc::new(BaseProcessor::new(registry, coordinator, client));

        let pubkey_converter: Arc<dyn PubkeyConverter> = Arc::new(Bech32PubkeyConverter::new(
            config.pubkey.hrp.clone(),
            config.pubkey.length,
        ));

        Self::from_parts(
            proc,
            pubkey_converter,
            &config.hasher,
            &config.marshalizer,
            Duration::from_secs(config.metrics_cache_ttl_secs),
            config.should_allow_entire_tx_pool_fetch,
        )
    }
}

/// Serve the REST API until ctrl-c.
pub async fn serve(config: ProxyConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config).context("wiring processors")?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    info!(bind = %config.server.bind, "proxy listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    info!("proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
    }
}
