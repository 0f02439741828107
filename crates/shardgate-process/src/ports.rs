//! Capability seams of the processing layer.
//!
//! Every collaborator a processor needs is injected through one of these
//! traits at construction time. The concrete adapters live in
//! [`crate::adapters`]; closure-backed stubs for tests live in
//! [`crate::testing`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use serde_json::Value;
use shardgate_data::{
    ApiLogs, GenericApiResponse, NodeData, ScQuery, ShardId, Transaction, TxCostData, VmOutput,
};

use crate::errors::ProcessError;

/// Outcome of one HTTP call against one observer.
///
/// The classification implements the cluster-wide failover convention:
/// `Ok` ends the trial loop, `Skip` moves to the next candidate, and
/// `Reject` is terminal for the transaction-send path while every other
/// path treats it as one more skip.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// 200 with a decoded JSON body.
    Ok(Value),
    /// The observer is down, timed out, or replied 404/408/429.
    Skip {
        /// Status when one was received at all.
        status: Option<StatusCode>,
        /// What went wrong, for the log line.
        reason: String,
    },
    /// Any other non-200 reply. The body is the observer's error envelope.
    Reject {
        /// Status returned by the observer.
        status: StatusCode,
        /// Decoded error envelope.
        body: GenericApiResponse,
    },
}

impl CallOutcome {
    /// Statuses that mean "try the next observer".
    pub fn is_skip_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::NOT_FOUND | StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS
        )
    }
}

/// The "call some observer in shard S" primitive every processor builds on.
///
/// Registry lookups are immutable reads; the two `call_*` methods suspend
/// on network I/O up to the per-call timeout.
#[async_trait]
pub trait Processor: Send + Sync {
    /// All configured shard IDs, metachain included.
    fn shard_ids(&self) -> Vec<ShardId>;

    /// Shard owning the given decoded address.
    fn compute_shard_id(&self, address: &[u8]) -> Result<ShardId, ProcessError>;

    /// Regular observers of a shard, in configured (trial) order.
    fn observers(&self, shard_id: ShardId) -> Result<Vec<NodeData>, ProcessError>;

    /// Full-history observers of a shard, in configured (trial) order.
    fn full_history_nodes(&self, shard_id: ShardId) -> Result<Vec<NodeData>, ProcessError>;

    /// Flat view over every regular observer.
    fn all_observers(&self) -> Result<Vec<NodeData>, ProcessError>;

    /// GET `path` on one observer.
    async fn call_get(&self, observer: &str, path: &str) -> CallOutcome;

    /// POST `body` to `path` on one observer.
    async fn call_post(&self, observer: &str, path: &str, body: &Value) -> CallOutcome;
}

/// Public-key codec for bech32-like account addresses.
pub trait PubkeyConverter: Send + Sync {
    /// Decode an account address into raw public-key bytes.
    fn decode(&self, encoded: &str) -> Result<Vec<u8>, ProcessError>;

    /// Encode raw public-key bytes into an account address.
    fn encode(&self, bytes: &[u8]) -> Result<String, ProcessError>;
}

/// Cryptographic hash over opaque bytes.
pub trait Hasher: Send + Sync {
    /// Digest of `data`.
    fn compute(&self, data: &[u8]) -> Vec<u8>;
}

/// Canonical byte serialization for hashing.
pub trait Marshalizer: Send + Sync {
    /// Serialize an already-shaped JSON value to canonical bytes.
    fn marshal(&self, value: &Value) -> Result<Vec<u8>, ProcessError>;
}

/// Merges the event logs of the same entity observed in two shards.
pub trait LogsMerger: Send + Sync {
    /// Merge `source` and `destination` logs into one view.
    fn merge_log_events(
        &self,
        source: Option<&ApiLogs>,
        destination: Option<&ApiLogs>,
    ) -> Option<ApiLogs>;
}

/// Resolves the gas cost of a transaction. Handlers accumulate per-call
/// state, so each request gets a fresh one from the factory.
#[async_trait]
pub trait TransactionCostHandler: Send + Sync {
    /// Estimate the cost of `tx`.
    async fn resolve_cost_request(&self, tx: &Transaction) -> Result<TxCostData, ProcessError>;
}

/// Factory producing one [`TransactionCostHandler`] per request.
pub type TxCostHandlerFactory =
    Arc<dyn Fn() -> Result<Box<dyn TransactionCostHandler>, ProcessError> + Send + Sync>;

/// Read-only smart-contract query execution.
#[async_trait]
pub trait ScQueryService: Send + Sync {
    /// Run `query` on an appropriate observer and return the VM output.
    async fn execute_query(&self, query: &ScQuery) -> Result<VmOutput, ProcessError>;
}

/// TTL-bounded cache for expensive cluster-wide metric views.
pub trait ResponseCacher: Send + Sync {
    /// Cached envelope for `key`, unless expired.
    fn load(&self, key: &str) -> Option<GenericApiResponse>;

    /// Cache `response` under `key` for `ttl`. Overwrites.
    fn store(&self, key: &str, response: &GenericApiResponse, ttl: Duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_statuses() {
        assert!(CallOutcome::is_skip_status(StatusCode::NOT_FOUND));
        assert!(CallOutcome::is_skip_status(StatusCode::REQUEST_TIMEOUT));
        assert!(CallOutcome::is_skip_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!CallOutcome::is_skip_status(StatusCode::BAD_REQUEST));
        assert!(!CallOutcome::is_skip_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!CallOutcome::is_skip_status(StatusCode::OK));
    }
}
