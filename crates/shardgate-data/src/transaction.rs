//! Transaction wire types.
//!
//! [`Transaction`] is the inbound shape clients submit; the proxy validates
//! it and forwards it verbatim. [`ApiTransactionResult`] is the observer's
//! view of a processed transaction, including the cross-shard notarization
//! fields the proxy promotes to `hyperblockNonce`/`hyperblockHash`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::observer::ShardId;

/// A transaction submitted through the proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender account nonce.
    pub nonce: u64,
    /// Transferred amount, a base-10 string of arbitrary precision.
    pub value: String,
    /// Bech32-encoded receiver address.
    pub receiver: String,
    /// Bech32-encoded sender address.
    pub sender: String,
    /// Gas price, omitted when zero.
    #[serde(rename = "gasPrice", default, skip_serializing_if = "is_zero")]
    pub gas_price: u64,
    /// Gas limit, omitted when zero.
    #[serde(rename = "gasLimit", default, skip_serializing_if = "is_zero")]
    pub gas_limit: u64,
    /// Opaque call data, base64 on the wire, forwarded untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Hex-encoded signature.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
    /// Network identifier, never empty on a valid submission.
    #[serde(rename = "chainID")]
    pub chain_id: String,
    /// Transaction format version, never zero on a valid submission.
    pub version: u32,
    /// Position inside a multi-transaction batch, assigned by the proxy.
    #[serde(skip)]
    pub index: usize,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

/// One event emitted during VM execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Account that emitted the event.
    #[serde(default)]
    pub address: String,
    /// Event identifier.
    #[serde(default)]
    pub identifier: String,
    /// Indexed topics, base64 on the wire.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    /// Unindexed payload, base64 on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Event log attached to a transaction or a smart-contract result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiLogs {
    /// Account the log belongs to.
    #[serde(default)]
    pub address: String,
    /// Emitted events, in execution order.
    #[serde(default)]
    pub events: Vec<LogEvent>,
}

/// A smart-contract result, uniquely identified by its hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSmartContractResult {
    /// Unique SCR hash.
    pub hash: String,
    /// Nonce of the SCR.
    #[serde(default)]
    pub nonce: u64,
    /// Transferred amount.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Receiver address.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub receiver: String,
    /// Sender address.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sender: String,
    /// Call data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Hash of the transaction that produced this SCR.
    #[serde(
        rename = "originalTxHash",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub original_tx_hash: String,
    /// Events emitted while executing this SCR.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<ApiLogs>,
}

/// Observer view of a processed transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTransactionResult {
    /// Transaction hash.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,
    /// Processing status as reported by the observer.
    #[serde(default)]
    pub status: String,
    /// Sender account nonce.
    #[serde(default)]
    pub nonce: u64,
    /// Transferred amount.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Bech32-encoded receiver address.
    #[serde(default)]
    pub receiver: String,
    /// Bech32-encoded sender address.
    #[serde(default)]
    pub sender: String,
    /// Shard the transaction originated in.
    #[serde(rename = "sourceShard", default)]
    pub source_shard: ShardId,
    /// Shard the transaction settles in.
    #[serde(rename = "destinationShard", default)]
    pub destination_shard: ShardId,
    /// Opaque call data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Secondary transactions produced by VM execution.
    #[serde(
        rename = "smartContractResults",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub smart_contract_results: Vec<ApiSmartContractResult>,
    /// Event logs attached to the transaction itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<ApiLogs>,
    /// Metachain nonce at which the destination block was notarized.
    #[serde(
        rename = "notarizedAtDestinationInMetaNonce",
        default,
        skip_serializing_if = "is_zero"
    )]
    pub notarized_at_destination_in_meta_nonce: u64,
    /// Metachain block hash at which the destination block was notarized.
    #[serde(
        rename = "notarizedAtDestinationInMetaHash",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub notarized_at_destination_in_meta_hash: String,
    /// Hyperblock nonce, promoted from the notarization fields by the proxy.
    #[serde(rename = "hyperblockNonce", default, skip_serializing_if = "is_zero")]
    pub hyperblock_nonce: u64,
    /// Hyperblock hash, promoted from the notarization fields by the proxy.
    #[serde(
        rename = "hyperblockHash",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub hyperblock_hash: String,
}

/// `data` payload returned by `/transaction/send`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHashData {
    /// Hash assigned by the observer.
    #[serde(rename = "txHash", default)]
    pub tx_hash: String,
}

/// `data` payload returned by `/transaction/send-multiple`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleTransactionsData {
    /// Count of transactions accepted by the observers.
    #[serde(rename = "numOfTxs", default)]
    pub num_of_txs: u64,
    /// Hash per transaction, keyed by submission position.
    #[serde(rename = "txsHashes", default)]
    pub txs_hashes: HashMap<usize, String>,
}

/// `data` payload returned by `/transaction/{hash}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTransactionData {
    /// The requested transaction.
    #[serde(default)]
    pub transaction: ApiTransactionResult,
}

/// `data` payload returned by `/transaction/cost`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxCostData {
    /// Estimated gas units.
    #[serde(rename = "txGasUnits", default)]
    pub tx_gas_units: u64,
    /// Failure detail when the estimation could not run.
    #[serde(rename = "returnMessage", default, skip_serializing_if = "String::is_empty")]
    pub return_message: String,
}
