//! Processing errors rendered as HTTP responses.
//!
//! The status is derived from the error kind: validation problems are 400,
//! not-found lookups are 404, the gated pool fetch is 403, and everything
//! else is a 500. An observer rejection is the one exception, its status
//! and body are relayed to the client untouched.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shardgate_data::{GenericApiResponse, ReturnCode};
use shardgate_process::ProcessError;

/// Wrapper making [`ProcessError`] an axum response.
#[derive(Debug)]
pub struct ApiError(pub ProcessError);

impl From<ProcessError> for ApiError {
    fn from(err: ProcessError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = error_response(self.0);
        (status, Json(body)).into_response()
    }
}

/// Status and envelope for a processing error.
pub fn error_response(err: ProcessError) -> (StatusCode, GenericApiResponse) {
    match err {
        ProcessError::ObserverRejected { status, body } => (status, body),

        ProcessError::InvalidTxFields { .. }
        | ProcessError::AddressDecode(_)
        | ProcessError::InvalidAddress
        | ProcessError::InvalidSenderAddress
        | ProcessError::InvalidReceiverAddress
        | ProcessError::InvalidSignatureHex
        | ProcessError::InvalidSignatureBytes
        | ProcessError::InvalidTransactionValueField
        | ProcessError::NoValidTransactionToSend => (
            StatusCode::BAD_REQUEST,
            GenericApiResponse::err(err.to_string(), ReturnCode::RequestError),
        ),

        ProcessError::TransactionNotFound | ProcessError::TransactionsNotFoundInPool => (
            StatusCode::NOT_FOUND,
            GenericApiResponse::err(err.to_string(), ReturnCode::RequestError),
        ),

        ProcessError::OperationNotAllowed => (
            StatusCode::FORBIDDEN,
            GenericApiResponse::err(err.to_string(), ReturnCode::RequestError),
        ),

        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            GenericApiResponse::err(other.to_string(), ReturnCode::InternalError),
        ),
    }
}
