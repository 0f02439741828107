//! Transaction pool views.
//!
//! Pool entries are field-projected by the observers (the caller picks the
//! fields), so each entry is an opaque JSON object.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::observer::ShardId;

/// One pool entry, projected to the requested fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WrappedTransaction {
    /// The projected fields of the pooled transaction.
    #[serde(rename = "txFields", default)]
    pub tx_fields: Value,
}

/// Pool contents of one shard, or of the whole cluster after aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionsPool {
    /// User transactions.
    #[serde(rename = "regularTransactions", default)]
    pub regular_transactions: Vec<WrappedTransaction>,
    /// Smart-contract results waiting for execution.
    #[serde(rename = "smartContractResults", default)]
    pub smart_contract_results: Vec<WrappedTransaction>,
    /// Reward transactions.
    #[serde(default)]
    pub rewards: Vec<WrappedTransaction>,
    /// Shards that contributed nothing to a cluster-wide aggregate, either
    /// because every observer failed or because none was configured. Empty
    /// for single-shard views.
    #[serde(rename = "droppedShards", default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_shards: Vec<ShardId>,
}

/// Pool entries of a single sender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionsPoolForSender {
    /// The sender's pooled transactions.
    #[serde(default)]
    pub transactions: Vec<WrappedTransaction>,
}

/// A gap in a sender's pooled nonce sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceGap {
    /// First missing nonce.
    pub from: u64,
    /// Last missing nonce.
    pub to: u64,
}

/// Nonce gaps of a single sender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsPoolNonceGaps {
    /// The gaps, lowest first.
    #[serde(default)]
    pub gaps: Vec<NonceGap>,
}

/// `data` payload of `/transaction/pool`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxPoolData {
    /// The pool view.
    #[serde(rename = "txPool", default)]
    pub tx_pool: TransactionsPool,
}

/// `data` payload of `/transaction/pool?by-sender=...`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolForSenderData {
    /// The sender's pool view.
    #[serde(rename = "txPool", default)]
    pub tx_pool: TransactionsPoolForSender,
}

/// `data` payload of `/transaction/pool?last-nonce=true&by-sender=...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolLastNonceData {
    /// Highest pooled nonce of the sender.
    #[serde(default)]
    pub nonce: u64,
}

/// `data` payload of `/transaction/pool?nonce-gaps=true&by-sender=...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolNonceGapsData {
    /// The sender's nonce gaps.
    #[serde(rename = "nonceGaps", default)]
    pub nonce_gaps: TransactionsPoolNonceGaps,
}
