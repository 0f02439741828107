//! Observer registry.
//!
//! Built once from the configuration snapshot at startup and read
//! concurrently afterwards. Order within a shard is the configured order
//! and defines the failover trial order; the proxy never reshuffles it and
//! never mutates health state, liveness is discovered per call.

use std::collections::BTreeMap;

use shardgate_data::{NodeData, ObserverRole, ShardId};

use crate::errors::ProcessError;

/// The `{shard → observers}` tables.
#[derive(Debug, Clone, Default)]
pub struct ObserverRegistry {
    observers: BTreeMap<ShardId, Vec<NodeData>>,
    full_history: BTreeMap<ShardId, Vec<NodeData>>,
}

impl ObserverRegistry {
    /// Build the registry from the configured observer lists.
    ///
    /// Fails when no regular observer is configured at all. Role tags are
    /// normalized so the full-history table only ever carries
    /// [`ObserverRole::FullHistory`] descriptors.
    pub fn new(
        observers: Vec<NodeData>,
        full_history_nodes: Vec<NodeData>,
    ) -> Result<Self, ProcessError> {
        if observers.is_empty() {
            return Err(ProcessError::InvalidShardCount);
        }

        let mut regular: BTreeMap<ShardId, Vec<NodeData>> = BTreeMap::new();
        for mut node in observers {
            node.role = ObserverRole::Regular;
            regular.entry(node.shard_id).or_default().push(node);
        }

        let mut full_history: BTreeMap<ShardId, Vec<NodeData>> = BTreeMap::new();
        for mut node in full_history_nodes {
            node.role = ObserverRole::FullHistory;
            full_history.entry(node.shard_id).or_default().push(node);
        }

        Ok(Self {
            observers: regular,
            full_history,
        })
    }

    /// Regular observers of `shard_id`, in trial order.
    pub fn observers(&self, shard_id: ShardId) -> Result<Vec<NodeData>, ProcessError> {
        match self.observers.get(&shard_id) {
            Some(nodes) if !nodes.is_empty() => Ok(nodes.clone()),
            _ => Err(ProcessError::NoObserversForShard(shard_id)),
        }
    }

    /// Full-history observers of `shard_id`, in trial order.
    ///
    /// Callers are expected to fall back to [`Self::observers`] when a
    /// deployment runs without dedicated full-history nodes.
    pub fn full_history_nodes(&self, shard_id: ShardId) -> Result<Vec<NodeData>, ProcessError> {
        match self.full_history.get(&shard_id) {
            Some(nodes) if !nodes.is_empty() => Ok(nodes.clone()),
            _ => Err(ProcessError::NoObserversForShard(shard_id)),
        }
    }

    /// Flat view over every regular observer, worker shards first.
    pub fn all_observers(&self) -> Vec<NodeData> {
        self.observers.values().flatten().cloned().collect()
    }

    /// All shard IDs with at least one regular observer. The metachain ID
    /// sorts last.
    pub fn shard_ids(&self) -> Vec<ShardId> {
        self.observers.keys().copied().collect()
    }

    /// Number of worker shards covered by the configuration.
    pub fn num_worker_shards(&self) -> u32 {
        self.observers
            .keys()
            .filter(|id| **id != shardgate_data::METACHAIN_SHARD_ID)
            .count() as u32
    }
}
