//! Closure-backed mocks for the capability seams.
//!
//! Each mock runs the configured closure when one is set and falls back to
//! a neutral default otherwise, so tests only stub what they exercise.

use async_trait::async_trait;
use serde_json::Value;
use shardgate_data::{ApiLogs, NodeData, ScQuery, ShardId, Transaction, TxCostData, VmOutput};

use crate::errors::ProcessError;
use crate::ports::{
    CallOutcome, LogsMerger, Processor, PubkeyConverter, ScQueryService, TransactionCostHandler,
};

type ShardIdsFn = dyn Fn() -> Vec<ShardId> + Send + Sync;
type ComputeShardFn = dyn Fn(&[u8]) -> Result<ShardId, ProcessError> + Send + Sync;
type ObserversFn = dyn Fn(ShardId) -> Result<Vec<NodeData>, ProcessError> + Send + Sync;
type AllObserversFn = dyn Fn() -> Result<Vec<NodeData>, ProcessError> + Send + Sync;
type CallGetFn = dyn Fn(&str, &str) -> CallOutcome + Send + Sync;
type CallPostFn = dyn Fn(&str, &str, &Value) -> CallOutcome + Send + Sync;

/// Mock [`Processor`].
#[derive(Default)]
pub struct MockProcessor {
    /// Overrides [`Processor::shard_ids`].
    pub shard_ids_fn: Option<Box<ShardIdsFn>>,
    /// Overrides [`Processor::compute_shard_id`].
    pub compute_shard_id_fn: Option<Box<ComputeShardFn>>,
    /// Overrides [`Processor::observers`].
    pub observers_fn: Option<Box<ObserversFn>>,
    /// Overrides [`Processor::full_history_nodes`].
    pub full_history_nodes_fn: Option<Box<ObserversFn>>,
    /// Overrides [`Processor::all_observers`].
    pub all_observers_fn: Option<Box<AllObserversFn>>,
    /// Overrides [`Processor::call_get`].
    pub call_get_fn: Option<Box<CallGetFn>>,
    /// Overrides [`Processor::call_post`].
    pub call_post_fn: Option<Box<CallPostFn>>,
}

#[async_trait]
impl Processor for MockProcessor {
    fn shard_ids(&self) -> Vec<ShardId> {
        match &self.shard_ids_fn {
            Some(f) => f(),
            None => Vec::new(),
        }
    }

    fn compute_shard_id(&self, address: &[u8]) -> Result<ShardId, ProcessError> {
        match &self.compute_shard_id_fn {
            Some(f) => f(address),
            None => Ok(0),
        }
    }

    fn observers(&self, shard_id: ShardId) -> Result<Vec<NodeData>, ProcessError> {
        match &self.observers_fn {
            Some(f) => f(shard_id),
            None => Err(ProcessError::NoObserversForShard(shard_id)),
        }
    }

    fn full_history_nodes(&self, shard_id: ShardId) -> Result<Vec<NodeData>, ProcessError> {
        match &self.full_history_nodes_fn {
            Some(f) => f(shard_id),
            None => Err(ProcessError::NoObserversForShard(shard_id)),
        }
    }

    fn all_observers(&self) -> Result<Vec<NodeData>, ProcessError> {
        match &self.all_observers_fn {
            Some(f) => f(),
            None => Ok(Vec::new()),
        }
    }

    async fn call_get(&self, observer: &str, path: &str) -> CallOutcome {
        match &self.call_get_fn {
            Some(f) => f(observer, path),
            None => CallOutcome::Skip {
                status: None,
                reason: "call_get not mocked".to_string(),
            },
        }
    }

    async fn call_post(&self, observer: &str, path: &str, body: &Value) -> CallOutcome {
        match &self.call_post_fn {
            Some(f) => f(observer, path, body),
            None => CallOutcome::Skip {
                status: None,
                reason: "call_post not mocked".to_string(),
            },
        }
    }
}

type DecodeFn = dyn Fn(&str) -> Result<Vec<u8>, ProcessError> + Send + Sync;
type EncodeFn = dyn Fn(&[u8]) -> Result<String, ProcessError> + Send + Sync;

/// Mock [`PubkeyConverter`]. The default treats addresses as plain hex.
#[derive(Default)]
pub struct MockPubkeyConverter {
    /// Overrides [`PubkeyConverter::decode`].
    pub decode_fn: Option<Box<DecodeFn>>,
    /// Overrides [`PubkeyConverter::encode`].
    pub encode_fn: Option<Box<EncodeFn>>,
}

impl PubkeyConverter for MockPubkeyConverter {
    fn decode(&self, encoded: &str) -> Result<Vec<u8>, ProcessError> {
        match &self.decode_fn {
            Some(f) => f(encoded),
            None => hex::decode(encoded).map_err(|e| ProcessError::AddressDecode(e.to_string())),
        }
    }

    fn encode(&self, bytes: &[u8]) -> Result<String, ProcessError> {
        match &self.encode_fn {
            Some(f) => f(bytes),
            None => Ok(hex::encode(bytes)),
        }
    }
}

type MergeFn = dyn Fn(Option<&ApiLogs>, Option<&ApiLogs>) -> Option<ApiLogs> + Send + Sync;

/// Mock [`LogsMerger`]. The default keeps the destination logs.
#[derive(Default)]
pub struct MockLogsMerger {
    /// Overrides [`LogsMerger::merge_log_events`].
    pub merge_fn: Option<Box<MergeFn>>,
}

impl LogsMerger for MockLogsMerger {
    fn merge_log_events(
        &self,
        source: Option<&ApiLogs>,
        destination: Option<&ApiLogs>,
    ) -> Option<ApiLogs> {
        match &self.merge_fn {
            Some(f) => f(source, destination),
            None => destination.or(source).cloned(),
        }
    }
}

type ExecuteQueryFn = dyn Fn(&ScQuery) -> Result<VmOutput, ProcessError> + Send + Sync;

/// Mock [`ScQueryService`].
#[derive(Default)]
pub struct MockScQueryService {
    /// Overrides [`ScQueryService::execute_query`].
    pub execute_query_fn: Option<Box<ExecuteQueryFn>>,
}

#[async_trait]
impl ScQueryService for MockScQueryService {
    async fn execute_query(&self, query: &ScQuery) -> Result<VmOutput, ProcessError> {
        match &self.execute_query_fn {
            Some(f) => f(query),
            None => Ok(VmOutput::default()),
        }
    }
}

type ResolveCostFn = dyn Fn(&Transaction) -> Result<TxCostData, ProcessError> + Send + Sync;

/// Mock [`TransactionCostHandler`].
#[derive(Default)]
pub struct MockTxCostHandler {
    /// Overrides [`TransactionCostHandler::resolve_cost_request`].
    pub resolve_fn: Option<Box<ResolveCostFn>>,
}

#[async_trait]
impl TransactionCostHandler for MockTxCostHandler {
    async fn resolve_cost_request(&self, tx: &Transaction) -> Result<TxCostData, ProcessError> {
        match &self.resolve_fn {
            Some(f) => f(tx),
            None => Ok(TxCostData::default()),
        }
    }
}
