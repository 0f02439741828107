//! Transaction endpoint group.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use shardgate_data::{GenericApiResponse, ReturnCode, ShardId, Transaction};
use shardgate_process::{ProcessError, UNKNOWN_STATUS};

use crate::errors::ApiError;
use crate::service::AppState;

/// POST `/transaction/send`
pub async fn send(
    State(state): State<AppState>,
    Json(tx): Json<Transaction>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let tx_hash = state.transactions.send_transaction(&tx).await?;
    Ok(Json(GenericApiResponse::ok(json!({ "txHash": tx_hash }))))
}

/// POST `/transaction/send-multiple`
pub async fn send_multiple(
    State(state): State<AppState>,
    Json(txs): Json<Vec<Transaction>>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let result = state.transactions.send_multiple_transactions(&txs).await?;
    Ok(Json(GenericApiResponse::ok(json!({
        "numOfSentTxs": result.num_of_txs,
        "txsHashes": result.txs_hashes,
    }))))
}

/// Query parameters of `/transaction/simulate`.
#[derive(Debug, Deserialize)]
pub struct SimulateQuery {
    /// Ask the observers to verify the signature; defaults to true.
    #[serde(rename = "checkSignature")]
    check_signature: Option<bool>,
}

/// POST `/transaction/simulate[?checkSignature=false]`
pub async fn simulate(
    State(state): State<AppState>,
    Query(params): Query<SimulateQuery>,
    Json(tx): Json<Transaction>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let check_signature = params.check_signature.unwrap_or(true);
    let response = state
        .transactions
        .simulate_transaction(&tx, check_signature)
        .await?;
    Ok(Json(response))
}

/// POST `/transaction/cost`
pub async fn cost(
    State(state): State<AppState>,
    Json(tx): Json<Transaction>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let cost = state.transactions.transaction_cost_request(&tx).await?;
    Ok(Json(GenericApiResponse::ok(json!({
        "txGasUnits": cost.tx_gas_units,
        "returnMessage": cost.return_message,
    }))))
}

/// Query parameters of `/transaction/{hash}`.
#[derive(Debug, Deserialize)]
pub struct ByHashQuery {
    /// Include smart-contract results and logs.
    #[serde(rename = "withResults")]
    with_results: Option<bool>,
    /// Sender address, skips the cross-shard search when present.
    sender: Option<String>,
}

/// GET `/transaction/{hash}[?withResults=true][&sender=...]`
pub async fn by_hash(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
    Query(params): Query<ByHashQuery>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let with_results = params.with_results.unwrap_or(false);

    let tx = match params.sender.as_deref() {
        Some(sender) if !sender.is_empty() => {
            state
                .transactions
                .get_transaction_by_hash_and_sender_address(&tx_hash, sender, with_results)
                .await?
        }
        _ => state.transactions.get_transaction(&tx_hash, with_results).await?,
    };

    Ok(Json(GenericApiResponse::ok(json!({ "transaction": tx }))))
}

/// Query parameters of `/transaction/{hash}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    /// Sender address hint.
    sender: Option<String>,
}

/// GET `/transaction/{hash}/status[?sender=...]`
pub async fn status(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
    Query(params): Query<StatusQuery>,
) -> Response {
    let sender = params.sender.unwrap_or_default();
    match state.transactions.get_transaction_status(&tx_hash, &sender).await {
        Ok(status) => Json(GenericApiResponse::ok(json!({ "status": status }))).into_response(),
        // The status endpoint always carries a status field, even on a miss.
        Err(ProcessError::TransactionNotFound) => (
            StatusCode::NOT_FOUND,
            Json(GenericApiResponse {
                data: json!({ "status": UNKNOWN_STATUS }),
                error: ProcessError::TransactionNotFound.to_string(),
                code: ReturnCode::RequestError,
            }),
        )
            .into_response(),
        Err(other) => ApiError(other).into_response(),
    }
}

/// Query parameters of `/transaction/pool`.
#[derive(Debug, Deserialize)]
pub struct PoolQuery {
    /// Restrict the view to one shard.
    shard: Option<ShardId>,
    /// Field projection passed through to the observers.
    fields: Option<String>,
    /// Restrict the view to one sender.
    #[serde(rename = "by-sender")]
    by_sender: Option<String>,
    /// Return only the sender's last pooled nonce.
    #[serde(rename = "last-nonce")]
    last_nonce: Option<bool>,
    /// Return only the sender's nonce gaps.
    #[serde(rename = "nonce-gaps")]
    nonce_gaps: Option<bool>,
}

/// GET `/transaction/pool` with its by-sender and by-shard variants.
pub async fn pool(
    State(state): State<AppState>,
    Query(params): Query<PoolQuery>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let fields = params.fields.unwrap_or_default();

    if let Some(sender) = params.by_sender.as_deref() {
        if params.last_nonce.unwrap_or(false) {
            let nonce = state.transactions.get_last_pool_nonce_for_sender(sender).await?;
            return Ok(Json(GenericApiResponse::ok(json!({ "nonce": nonce }))));
        }
        if params.nonce_gaps.unwrap_or(false) {
            let gaps = state
                .transactions
                .get_transactions_pool_nonce_gaps_for_sender(sender)
                .await?;
            return Ok(Json(GenericApiResponse::ok(json!({ "nonceGaps": gaps }))));
        }
        let pool = state
            .transactions
            .get_transactions_pool_for_sender(sender, &fields)
            .await?;
        return Ok(Json(GenericApiResponse::ok(json!({ "txPool": pool }))));
    }

    let pool = match params.shard {
        Some(shard_id) => {
            state
                .transactions
                .get_transactions_pool_for_shard(shard_id, &fields)
                .await?
        }
        None => state.transactions.get_transactions_pool(&fields).await?,
    };
    Ok(Json(GenericApiResponse::ok(json!({ "txPool": pool }))))
}
