//! Gas cost estimation.
//!
//! The handler queries a sender-shard observer for the cost of a
//! transaction. Handlers are created per request through
//! [`TxCostHandlerFactory`] since cost resolution accumulates state for a
//! single transaction.

use std::sync::Arc;

use async_trait::async_trait;
use shardgate_data::{ApiResponse, Transaction, TxCostData};
use tracing::{info, warn};

use crate::errors::ProcessError;
use crate::ports::{
    CallOutcome, Processor, PubkeyConverter, TransactionCostHandler, TxCostHandlerFactory,
};

/// Transaction cost path on the observers.
pub const TRANSACTION_COST_PATH: &str = "/transaction/cost";

/// Cost handler backed by the sender-shard observers.
pub struct ObserverTxCostHandler {
    proc: Arc<dyn Processor>,
    pubkey_converter: Arc<dyn PubkeyConverter>,
}

impl ObserverTxCostHandler {
    /// Handler over the given processor and codec.
    pub fn new(proc: Arc<dyn Processor>, pubkey_converter: Arc<dyn PubkeyConverter>) -> Self {
        Self {
            proc,
            pubkey_converter,
        }
    }
}

#[async_trait]
impl TransactionCostHandler for ObserverTxCostHandler {
    async fn resolve_cost_request(&self, tx: &Transaction) -> Result<TxCostData, ProcessError> {
        let sender = self.pubkey_converter.decode(&tx.sender)?;
        let shard_id = self.proc.compute_shard_id(&sender)?;
        let observers = self.proc.observers(shard_id)?;
        let body =
            serde_json::to_value(tx).map_err(|e| ProcessError::Internal(e.to_string()))?;

        for observer in &observers {
            match self
                .proc
                .call_post(&observer.address, TRANSACTION_COST_PATH, &body)
                .await
            {
                CallOutcome::Ok(value) => {
                    let response: ApiResponse<TxCostData> = match serde_json::from_value(value) {
                        Ok(response) => response,
                        Err(e) => {
                            warn!(observer = %observer.address, error = %e, "malformed cost response");
                            continue;
                        }
                    };
                    info!(
                        observer = %observer.address,
                        shard = shard_id,
                        gas = response.data.tx_gas_units,
                        "transaction cost resolved"
                    );
                    return Ok(response.data);
                }
                CallOutcome::Skip { reason, .. } => {
                    warn!(observer = %observer.address, reason, "skipping observer for cost request");
                }
                CallOutcome::Reject { status, body } => {
                    return Err(ProcessError::ObserverRejected { status, body });
                }
            }
        }

        Err(ProcessError::SendingRequest)
    }
}

/// Factory producing a fresh [`ObserverTxCostHandler`] per request.
pub fn observer_tx_cost_factory(
    proc: Arc<dyn Processor>,
    pubkey_converter: Arc<dyn PubkeyConverter>,
) -> TxCostHandlerFactory {
    Arc::new(move || {
        Ok(Box::new(ObserverTxCostHandler::new(
            Arc::clone(&proc),
            Arc::clone(&pubkey_converter),
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockProcessor, MockPubkeyConverter};
    use http::StatusCode;
    use serde_json::json;
    use shardgate_data::NodeData;

    fn tx() -> Transaction {
        Transaction {
            value: "0".to_string(),
            sender: hex::encode([0xAA; 32]),
            receiver: hex::encode([0xBB; 32]),
            chain_id: "1".to_string(),
            version: 1,
            ..Transaction::default()
        }
    }

    #[tokio::test]
    async fn test_cost_resolved_from_first_healthy_observer() {
        let proc = MockProcessor {
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![
                    NodeData::new("http://down", shard),
                    NodeData::new("http://up", shard),
                ])
            })),
            call_post_fn: Some(Box::new(|observer, path, _| {
                assert_eq!(path, TRANSACTION_COST_PATH);
                if observer == "http://down" {
                    CallOutcome::Skip {
                        status: Some(StatusCode::REQUEST_TIMEOUT),
                        reason: "timeout".to_string(),
                    }
                } else {
                    CallOutcome::Ok(json!({
                        "data": {"txGasUnits": 70_000},
                        "error": "",
                        "code": "successful"
                    }))
                }
            })),
            ..MockProcessor::default()
        };

        let handler =
            ObserverTxCostHandler::new(Arc::new(proc), Arc::new(MockPubkeyConverter::default()));
        let cost = handler.resolve_cost_request(&tx()).await.unwrap();
        assert_eq!(cost.tx_gas_units, 70_000);
    }

    #[tokio::test]
    async fn test_cost_exhaustion() {
        let proc = MockProcessor {
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new("http://obs", shard)])
            })),
            call_post_fn: Some(Box::new(|_, _, _| CallOutcome::Skip {
                status: None,
                reason: "connection refused".to_string(),
            })),
            ..MockProcessor::default()
        };

        let handler =
            ObserverTxCostHandler::new(Arc::new(proc), Arc::new(MockPubkeyConverter::default()));
        let err = handler.resolve_cost_request(&tx()).await.unwrap_err();
        assert_eq!(err, ProcessError::SendingRequest);
    }

    #[test]
    fn test_factory_builds_fresh_handlers() {
        let factory = observer_tx_cost_factory(
            Arc::new(MockProcessor::default()),
            Arc::new(MockPubkeyConverter::default()),
        );
        assert!(factory().is_ok());
        assert!(factory().is_ok());
    }
}
