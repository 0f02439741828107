//! Base processor.
//!
//! Composes the observer registry, the shard coordinator and the HTTP
//! client into the [`Processor`] port the concrete processors are built on.

use async_trait::async_trait;
use serde_json::Value;
use shardgate_data::{NodeData, ShardId};

use crate::client::HttpClient;
use crate::errors::ProcessError;
use crate::ports::{CallOutcome, Processor};
use crate::registry::ObserverRegistry;
use crate::sharding::ShardCoordinator;

/// The concrete [`Processor`] used in production wiring.
pub struct BaseProcessor {
    registry: ObserverRegistry,
    coordinator: ShardCoordinator,
    client: HttpClient,
}

impl BaseProcessor {
    /// Wire the three collaborators together.
    pub fn new(
        registry: ObserverRegistry,
        coordinator: ShardCoordinator,
        client: HttpClient,
    ) -> Self {
        Self {
            registry,
            coordinator,
            client,
        }
    }
}

#[async_trait]
impl Processor for BaseProcessor {
    fn shard_ids(&self) -> Vec<ShardId> {
        self.registry.shard_ids()
    }

    fn compute_shard_id(&self, address: &[u8]) -> Result<ShardId, ProcessError> {
        self.coordinator.compute_shard_id(address)
    }

    fn observers(&self, shard_id: ShardId) -> Result<Vec<NodeData>, ProcessError> {
        self.registry.observers(shard_id)
    }

    fn full_history_nodes(&self, shard_id: ShardId) -> Result<Vec<NodeData>, ProcessError> {
        self.registry.full_history_nodes(shard_id)
    }

    fn all_observers(&self) -> Result<Vec<NodeData>, ProcessError> {
        Ok(self.registry.all_observers())
    }

    async fn call_get(&self, observer: &str, path: &str) -> CallOutcome {
        self.client.get(observer, path).await
    }

    async fn call_post(&self, observer: &str, path: &str, body: &Value) -> CallOutcome {
        self.client.post(observer, path, body).await
    }
}
