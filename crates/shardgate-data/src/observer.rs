//! Observer descriptors.

use serde::{Deserialize, Serialize};

/// Shard identifier.
pub type ShardId = u32;

/// The coordinating shard. All worker shards are numbered from zero.
pub const METACHAIN_SHARD_ID: ShardId = u32::MAX;

/// Role of an observer within its shard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObserverRole {
    /// Serves live queries only.
    #[default]
    Regular,
    /// Retains full chain history, required for archival queries.
    FullHistory,
}

/// One observer node, discovered from configuration at boot.
///
/// Identity is the network address; the descriptor never changes after
/// startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    /// Base URL of the observer's REST API.
    pub address: String,
    /// Shard served by this observer.
    #[serde(rename = "shardId")]
    pub shard_id: ShardId,
    /// Regular or full-history.
    #[serde(default)]
    pub role: ObserverRole,
}

impl NodeData {
    /// Regular observer descriptor.
    pub fn new(address: impl Into<String>, shard_id: ShardId) -> Self {
        Self {
            address: address.into(),
            shard_id,
            role: ObserverRole::Regular,
        }
    }

    /// Full-history observer descriptor.
    pub fn full_history(address: impl Into<String>, shard_id: ShardId) -> Self {
        Self {
            address: address.into(),
            shard_id,
            role: ObserverRole::FullHistory,
        }
    }

    /// True for the metachain descriptor.
    pub fn is_metachain(&self) -> bool {
        self.shard_id == METACHAIN_SHARD_ID
    }
}
