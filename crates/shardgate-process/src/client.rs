//! HTTP fan-out primitive.
//!
//! One call, one observer. The client performs the request with a per-call
//! timeout, decodes the JSON envelope, and classifies the result into the
//! failover convention's three outcomes. Connections are kept alive per
//! backend address by the underlying pool.

use std::time::Duration;

use http::StatusCode;
use serde_json::Value;
use shardgate_data::{GenericApiResponse, ReturnCode};
use tracing::debug;

use crate::errors::ProcessError;
use crate::ports::CallOutcome;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Thin wrapper over a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Client with the given per-request timeout.
    pub fn new(request_timeout: Duration) -> Result<Self, ProcessError> {
        let inner = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ProcessError::Setup(e.to_string()))?;

        Ok(Self { inner })
    }

    /// GET `path` on `observer`.
    pub async fn get(&self, observer: &str, path: &str) -> CallOutcome {
        let url = join_url(observer, path);
        let response = self.inner.get(&url).send().await;
        Self::classify(&url, response).await
    }

    /// POST `body` to `path` on `observer`.
    pub async fn post(&self, observer: &str, path: &str, body: &Value) -> CallOutcome {
        let url = join_url(observer, path);
        let response = self.inner.post(&url).json(body).send().await;
        Self::classify(&url, response).await
    }

    async fn classify(
        url: &str,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> CallOutcome {
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                debug!(url, error = %e, "observer call failed in transport");
                return CallOutcome::Skip {
                    status: None,
                    reason: e.to_string(),
                };
            }
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return CallOutcome::Skip {
                    status: Some(status),
                    reason: format!("reading response body: {e}"),
                }
            }
        };

        if status == StatusCode::OK {
            return match serde_json::from_slice::<Value>(&bytes) {
                Ok(body) => CallOutcome::Ok(body),
                Err(e) => CallOutcome::Skip {
                    status: Some(status),
                    reason: format!("decoding response body: {e}"),
                },
            };
        }

        if CallOutcome::is_skip_status(status) {
            return CallOutcome::Skip {
                status: Some(status),
                reason: format!("observer replied {status}"),
            };
        }

        let body = serde_json::from_slice::<GenericApiResponse>(&bytes).unwrap_or_else(|_| {
            GenericApiResponse::err(
                String::from_utf8_lossy(&bytes).into_owned(),
                ReturnCode::InternalError,
            )
        });

        CallOutcome::Reject { status, body }
    }
}

fn join_url(observer: &str, path: &str) -> String {
    format!("{}{}", observer.trim_end_matches('/'), path)
}
