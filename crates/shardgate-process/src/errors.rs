//! Error taxonomy of the processing layer.
//!
//! Validation errors go straight back to the client; skip-class backend
//! failures are absorbed by the failover loops and only surface as
//! [`ProcessError::SendingRequest`] once every candidate is exhausted.

use http::StatusCode;
use shardgate_data::{GenericApiResponse, ShardId};
use thiserror::Error;

/// Which leg of a cross-shard simulation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationSide {
    /// The sender-shard leg.
    Sender,
    /// The receiver-shard leg.
    Receiver,
}

impl std::fmt::Display for SimulationSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationSide::Sender => write!(f, "sender"),
            SimulationSide::Receiver => write!(f, "receiver"),
        }
    }
}

/// Errors produced by the processing layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessError {
    /// No observer is configured for the requested shard.
    #[error("no observer available for shard {0}")]
    NoObserversForShard(ShardId),

    /// Every observer in scope failed transport or replied with a
    /// skip-class status.
    #[error("sending request error")]
    SendingRequest,

    /// A collaborator could not be built at wiring time.
    #[error("setup failed: {0}")]
    Setup(String),

    /// The proxy itself failed while preparing or interpreting a request.
    #[error("internal error: {0}")]
    Internal(String),

    /// Shard count of zero at wiring time.
    #[error("invalid number of shards")]
    InvalidShardCount,

    /// A metric cache was wired with a zero validity window.
    #[error("invalid cache validity duration")]
    InvalidCacheValidityDuration,

    /// An address failed the public-key codec.
    #[error("cannot decode address: {0}")]
    AddressDecode(String),

    /// Catch-all invalid address at a non-transaction call site.
    #[error("invalid address")]
    InvalidAddress,

    /// The sender address of a transaction is malformed.
    #[error("invalid sender address")]
    InvalidSenderAddress,

    /// The receiver address of a transaction is malformed.
    #[error("invalid receiver address")]
    InvalidReceiverAddress,

    /// The signature field is not valid hex.
    #[error("invalid signature hex")]
    InvalidSignatureHex,

    /// The signature bytes could not be recovered.
    #[error("invalid signature bytes")]
    InvalidSignatureBytes,

    /// The value field is not a base-10 integer.
    #[error("invalid transaction value field")]
    InvalidTransactionValueField,

    /// A transaction failed submit-time validation.
    #[error("{message} ({reason})")]
    InvalidTxFields {
        /// What was rejected.
        message: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Every transaction of a batch failed validation.
    #[error("no valid transaction to send")]
    NoValidTransactionToSend,

    /// A shard group of a batch has no configured observer.
    #[error("missing observer")]
    MissingObserver,

    /// No observer in scope knows the transaction.
    #[error("transaction not found")]
    TransactionNotFound,

    /// No observer returned pool data for the sender.
    #[error("transactions not found in pool")]
    TransactionsNotFoundInPool,

    /// Cluster-wide pool fetch is disabled by configuration.
    #[error("operation not allowed")]
    OperationNotAllowed,

    /// The canonical transaction hash could not be computed.
    #[error("cannot compute transaction hash: {0}")]
    ComputeTransactionHash(String),

    /// The node status payload did not carry the expected metrics.
    #[error("cannot parse node status metrics")]
    InvalidStatusMetrics,

    /// An observer rejected the request outright; the status and body are
    /// relayed to the client as-is.
    #[error("observer rejected the request with status {status}")]
    ObserverRejected {
        /// Status returned by the observer.
        status: StatusCode,
        /// Decoded error envelope returned by the observer.
        body: GenericApiResponse,
    },

    /// A simulation leg failed.
    #[error("{cause} while trying to simulate on {side} shard (shard {shard})")]
    Simulation {
        /// Which leg failed.
        side: SimulationSide,
        /// The shard the leg targeted.
        shard: ShardId,
        /// The underlying failure.
        cause: Box<ProcessError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_shard() {
        let err = ProcessError::NoObserversForShard(2);
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_invalid_tx_fields_display() {
        let err = ProcessError::InvalidTxFields {
            message: "invalid sender address".to_string(),
            reason: "checksum mismatch".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("invalid sender address"));
        assert!(rendered.contains("checksum mismatch"));
    }

    #[test]
    fn test_simulation_wraps_cause() {
        let err = ProcessError::Simulation {
            side: SimulationSide::Receiver,
            shard: 1,
            cause: Box::new(ProcessError::SendingRequest),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("receiver"));
        assert!(rendered.contains("sending request error"));
    }
}
