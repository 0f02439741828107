//! Route table.

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use shardgate_data::GenericApiResponse;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::groups::{network, transaction, vm_values};
use crate::service::AppState;

/// Build the REST router over the wired processors.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/about", get(about))
        .route("/network/config", get(network::config))
        .route("/network/economics", get(network::economics))
        .route("/network/enable-epochs", get(network::enable_epochs))
        .route("/network/status/:shard", get(network::status))
        .route("/network/esdts", get(network::all_issued_esdts))
        .route("/network/delegated-info", get(network::delegated_info))
        .route("/network/direct-staked-info", get(network::direct_staked_info))
        .route(
            "/network/latest-hyperblock-nonce",
            get(network::latest_hyperblock_nonce),
        )
        .route("/network/esdt/supply/:token", get(network::esdt_supply))
        .route("/transaction/send", post(transaction::send))
        .route("/transaction/send-multiple", post(transaction::send_multiple))
        .route("/transaction/simulate", post(transaction::simulate))
        .route("/transaction/cost", post(transaction::cost))
        .route("/transaction/pool", get(transaction::pool))
        .route("/transaction/:hash", get(transaction::by_hash))
        .route("/transaction/:hash/status", get(transaction::status))
        .route("/vm-values/query", post(vm_values::query))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn about() -> Json<GenericApiResponse> {
    Json(GenericApiResponse::ok(json!({
        "appName": "shardgate",
        "version": crate::VERSION,
    })))
}
