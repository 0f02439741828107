//! # ShardGate Processing Layer
//!
//! Request routing and observer coordination for a sharded observer fleet.
//!
//! The layer turns a logical API call into the right backend call on the
//! right observer: it maps addresses to shards, walks the configured
//! observers of a shard in order until one answers, and reconciles the
//! source and destination views of cross-shard transactions.
//!
//! ## Module Structure
//!
//! ```text
//! shardgate-process/
//! ├── registry.rs      # {shard → observers} tables
//! ├── sharding.rs      # address → shard arithmetic
//! ├── client.rs        # single-observer HTTP calls + outcome classification
//! ├── base.rs          # the Processor port wired from the three above
//! ├── cache.rs         # TTL cache for cluster metrics
//! ├── node_status.rs   # cluster-wide metric views
//! ├── transaction.rs   # send / simulate / lookup / pool operations
//! ├── tx_cost.rs       # per-request gas cost handlers
//! ├── esdt_supply.rs   # token supply aggregation
//! ├── sc_query.rs      # read-only VM queries
//! ├── ports.rs         # capability traits
//! ├── adapters/        # bech32 codec, hashers, marshalizer, logs merger
//! └── testing.rs       # closure-backed mocks
//! ```
//!
//! ## Failover convention
//!
//! Observers of a shard are tried in configured order. A 200 ends the loop;
//! 404, 408, 429 and transport errors skip to the next candidate; any other
//! status is terminal for transaction sends and one more skip for
//! everything else. Exhausting the candidates yields
//! [`ProcessError::SendingRequest`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod base;
pub mod cache;
pub mod client;
pub mod errors;
pub mod esdt_supply;
pub mod node_status;
pub mod ports;
pub mod registry;
pub mod sc_query;
pub mod sharding;
pub mod testing;
pub mod transaction;
pub mod tx_cost;

pub use base::BaseProcessor;
pub use cache::MetricsCache;
pub use client::HttpClient;
pub use errors::{ProcessError, SimulationSide};
pub use esdt_supply::{EsdtSupplyProcessor, ESDT_CONTRACT_ADDRESS};
pub use node_status::{
    NodeStatusProcessor, METRIC_CROSS_CHECK_BLOCK_HEIGHT, METRIC_NONCE,
};
pub use ports::{
    CallOutcome, Hasher, LogsMerger, Marshalizer, Processor, PubkeyConverter, ResponseCacher,
    ScQueryService, TransactionCostHandler, TxCostHandlerFactory,
};
pub use registry::ObserverRegistry;
pub use sc_query::{ScQueryProcessor, VM_VALUES_QUERY_PATH};
pub use sharding::ShardCoordinator;
pub use transaction::{TransactionProcessor, UNKNOWN_STATUS};
pub use tx_cost::{observer_tx_cost_factory, ObserverTxCostHandler};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
