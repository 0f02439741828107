//! # ShardGate Data Model
//!
//! Shared wire types for the ShardGate observer proxy.
//!
//! Everything that crosses a boundary lives here: the generic API envelope
//! used by both the proxy and the observers, observer descriptors, the
//! transaction views returned by the backend, token supply types and the
//! read-only smart-contract query types.
//!
//! ## Module Structure
//!
//! ```text
//! shardgate-data/
//! ├── envelope.rs      # ApiResponse<T>, GenericApiResponse, ReturnCode
//! ├── observer.rs      # NodeData, ObserverRole, ShardId
//! ├── transaction.rs   # Transaction, ApiTransactionResult, SCRs, logs
//! ├── pool.rs          # Transaction pool views
//! ├── esdt.rs          # Token supply types
//! └── scquery.rs       # VM query request/response types
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod envelope;
pub mod esdt;
pub mod observer;
pub mod pool;
pub mod scquery;
pub mod transaction;

pub use envelope::{ApiResponse, GenericApiResponse, ReturnCode};
pub use esdt::{EsdtSupplyData, EsdtSupplyResponse};
pub use observer::{NodeData, ObserverRole, ShardId, METACHAIN_SHARD_ID};
pub use pool::{
    NonceGap, PoolForSenderData, PoolLastNonceData, PoolNonceGapsData, TransactionsPool,
    TransactionsPoolForSender, TransactionsPoolNonceGaps, TxPoolData, WrappedTransaction,
};
pub use scquery::{ScQuery, VmOutput, VmValueRequest, VmValuesData};
pub use transaction::{
    ApiLogs, ApiSmartContractResult, ApiTransactionResult, GetTransactionData, LogEvent,
    MultipleTransactionsData, Transaction, TxCostData, TxHashData,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
