//! Network endpoint group.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use shardgate_data::{GenericApiResponse, ShardId};

use crate::errors::ApiError;
use crate::service::AppState;

/// GET `/network/config`
pub async fn config(
    State(state): State<AppState>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let response = state.node_status.network_config_metrics().await?;
    Ok(Json(response))
}

/// GET `/network/economics`
pub async fn economics(
    State(state): State<AppState>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let response = state.node_status.economics_metrics().await?;
    Ok(Json(response))
}

/// GET `/network/enable-epochs`
pub async fn enable_epochs(
    State(state): State<AppState>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let response = state.node_status.enable_epochs_metrics().await?;
    Ok(Json(response))
}

/// GET `/network/status/{shard}`
pub async fn status(
    State(state): State<AppState>,
    Path(shard_id): Path<ShardId>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let response = state.node_status.network_status_metrics(shard_id).await?;
    Ok(Json(response))
}

/// GET `/network/esdts`
pub async fn all_issued_esdts(
    State(state): State<AppState>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let response = state.node_status.all_issued_esdts().await?;
    Ok(Json(response))
}

/// GET `/network/delegated-info`
pub async fn delegated_info(
    State(state): State<AppState>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let response = state.node_status.delegated_info().await?;
    Ok(Json(response))
}

/// GET `/network/direct-staked-info`
pub async fn direct_staked_info(
    State(state): State<AppState>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let response = state.node_status.direct_staked_info().await?;
    Ok(Json(response))
}

/// GET `/network/latest-hyperblock-nonce`
pub async fn latest_hyperblock_nonce(
    State(state): State<AppState>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let nonce = state
        .node_status
        .latest_fully_synchronized_hyperblock_nonce()
        .await?;
    Ok(Json(GenericApiResponse::ok(json!({ "nonce": nonce }))))
}

/// GET `/network/esdt/supply/{token}`
pub async fn esdt_supply(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let response = state.esdt_supply.get_esdt_supply(&token).await?;
    Ok(Json(GenericApiResponse::ok(json!({
        "supply": response.data.supply
    }))))
}
