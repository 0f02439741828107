//! The uniform response envelope.
//!
//! Every observer response and every proxy response share the same shape:
//! a `data` payload, an `error` string (empty on success) and a return code.
//! The payload stays opaque at this layer; each endpoint deserializes the
//! concrete `data` type it expects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Return code carried by every API envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnCode {
    /// The request was served.
    #[default]
    #[serde(rename = "successful")]
    Success,
    /// The proxy or the observer failed internally.
    #[serde(rename = "internal_issue")]
    InternalError,
    /// The request itself was malformed.
    #[serde(rename = "bad_request")]
    RequestError,
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnCode::Success => write!(f, "successful"),
            ReturnCode::InternalError => write!(f, "internal_issue"),
            ReturnCode::RequestError => write!(f, "bad_request"),
        }
    }
}

/// Typed API envelope.
///
/// Observers wrap every payload in this shape. `T` is the per-endpoint
/// `data` schema; unknown or mixed payloads use [`GenericApiResponse`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de> + Default"))]
pub struct ApiResponse<T> {
    /// Endpoint-specific payload.
    #[serde(default)]
    pub data: T,
    /// Human-readable error, empty on success.
    #[serde(default)]
    pub error: String,
    /// Machine-readable outcome.
    #[serde(default)]
    pub code: ReturnCode,
}

/// Envelope with an opaque payload.
pub type GenericApiResponse = ApiResponse<Value>;

impl GenericApiResponse {
    /// Successful envelope around an already-serialized payload.
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            error: String::new(),
            code: ReturnCode::Success,
        }
    }

    /// Failed envelope with no payload.
    pub fn err(error: impl Into<String>, code: ReturnCode) -> Self {
        Self {
            data: Value::Null,
            error: error.into(),
            code,
        }
    }
}

impl<T> ApiResponse<T> {
    /// True when the envelope reports success.
    pub fn is_success(&self) -> bool {
        self.code == ReturnCode::Success && self.error.is_empty()
    }
}
