//! Read-only smart-contract queries.
//!
//! Queries are forwarded to an observer of the shard owning the contract
//! address. System contracts therefore land on the metachain, which is
//! where the callers of this processor expect their views to run.

use std::sync::Arc;

use async_trait::async_trait;
use shardgate_data::{ApiResponse, ScQuery, VmOutput, VmValuesData};
use tracing::{debug, info};

use crate::errors::ProcessError;
use crate::ports::{CallOutcome, Processor, PubkeyConverter, ScQueryService};

/// VM query path on the observers.
pub const VM_VALUES_QUERY_PATH: &str = "/vm-values/query";

/// Forwards structured queries with first-success failover.
pub struct ScQueryProcessor {
    proc: Arc<dyn Processor>,
    pubkey_converter: Arc<dyn PubkeyConverter>,
}

impl ScQueryProcessor {
    /// Wire the processor over the base processor and the codec.
    pub fn new(proc: Arc<dyn Processor>, pubkey_converter: Arc<dyn PubkeyConverter>) -> Self {
        Self {
            proc,
            pubkey_converter,
        }
    }
}

#[async_trait]
impl ScQueryService for ScQueryProcessor {
    async fn execute_query(&self, query: &ScQuery) -> Result<VmOutput, ProcessError> {
        let address = self.pubkey_converter.decode(&query.sc_address)?;
        let shard_id = self.proc.compute_shard_id(&address)?;
        let observers = self.proc.observers(shard_id)?;

        let body = serde_json::to_value(query.to_request())
            .map_err(|e| ProcessError::Internal(e.to_string()))?;

        for observer in &observers {
            match self
                .proc
                .call_post(&observer.address, VM_VALUES_QUERY_PATH, &body)
                .await
            {
                CallOutcome::Ok(value) => {
                    let response: ApiResponse<VmValuesData> = match serde_json::from_value(value) {
                        Ok(response) => response,
                        Err(e) => {
                            debug!(observer = %observer.address, error = %e, "malformed vm query body");
                            continue;
                        }
                    };
                    info!(
                        observer = %observer.address,
                        shard = shard_id,
                        func = %query.func_name,
                        "sc query executed"
                    );
                    return Ok(response.data.data);
                }
                CallOutcome::Skip { reason, .. } => {
                    debug!(observer = %observer.address, reason, "skipping observer for sc query");
                }
                CallOutcome::Reject { status, .. } => {
                    debug!(observer = %observer.address, %status, "observer rejected sc query");
                }
            }
        }

        Err(ProcessError::SendingRequest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockProcessor, MockPubkeyConverter};
    use http::StatusCode;
    use serde_json::json;
    use shardgate_data::{NodeData, ShardId};

    fn query() -> ScQuery {
        ScQuery::new(hex::encode([0xAA; 32]), "getSum").with_argument(vec![0x01])
    }

    fn proc_with_observers() -> MockProcessor {
        MockProcessor {
            compute_shard_id_fn: Some(Box::new(|_| Ok(1 as ShardId))),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![
                    NodeData::new("http://down", shard),
                    NodeData::new("http://up", shard),
                ])
            })),
            ..MockProcessor::default()
        }
    }

    #[tokio::test]
    async fn test_query_returns_vm_output_verbatim() {
        let mut proc = proc_with_observers();
        proc.call_post_fn = Some(Box::new(|observer, path, body| {
            assert_eq!(path, VM_VALUES_QUERY_PATH);
            assert_eq!(body["funcName"], "getSum");
            assert_eq!(body["args"][0], "01");
            if observer == "http://down" {
                CallOutcome::Skip {
                    status: Some(StatusCode::NOT_FOUND),
                    reason: "observer replied 404".to_string(),
                }
            } else {
                CallOutcome::Ok(json!({
                    "data": {"data": {
                        "returnData": ["MjU="],
                        "returnCode": "ok"
                    }},
                    "error": "",
                    "code": "successful"
                }))
            }
        }));

        let processor =
            ScQueryProcessor::new(Arc::new(proc), Arc::new(MockPubkeyConverter::default()));
        let output = processor.execute_query(&query()).await.unwrap();
        assert_eq!(output.return_data, vec!["MjU=".to_string()]);
        assert_eq!(output.return_code, "ok");
    }

    #[tokio::test]
    async fn test_rejecting_observer_counts_as_skip() {
        let mut proc = proc_with_observers();
        proc.call_post_fn = Some(Box::new(|observer, _, _| {
            if observer == "http://down" {
                CallOutcome::Reject {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: shardgate_data::GenericApiResponse::err(
                        "vm panic",
                        shardgate_data::ReturnCode::InternalError,
                    ),
                }
            } else {
                CallOutcome::Ok(json!({
                    "data": {"data": {"returnData": [], "returnCode": "ok"}},
                    "error": "",
                    "code": "successful"
                }))
            }
        }));

        let processor =
            ScQueryProcessor::new(Arc::new(proc), Arc::new(MockPubkeyConverter::default()));
        let output = processor.execute_query(&query()).await.unwrap();
        assert_eq!(output.return_code, "ok");
    }

    #[tokio::test]
    async fn test_exhaustion_is_sending_request() {
        let mut proc = proc_with_observers();
        proc.call_post_fn = Some(Box::new(|_, _, _| CallOutcome::Skip {
            status: None,
            reason: "connection refused".to_string(),
        }));

        let processor =
            ScQueryProcessor::new(Arc::new(proc), Arc::new(MockPubkeyConverter::default()));
        let err = processor.execute_query(&query()).await.unwrap_err();
        assert_eq!(err, ProcessError::SendingRequest);
    }

    #[tokio::test]
    async fn test_bad_contract_address_fails() {
        let processor = ScQueryProcessor::new(
            Arc::new(MockProcessor::default()),
            Arc::new(MockPubkeyConverter::default()),
        );
        let bad = ScQuery::new("not-hex", "getSum");
        assert!(processor.execute_query(&bad).await.is_err());
    }
}
