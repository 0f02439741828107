//! VM query endpoint group.

use axum::extract::State;
use axum::Json;
use serde_json::json;
use shardgate_data::{GenericApiResponse, ScQuery, VmValueRequest};
use shardgate_process::{ProcessError, ScQueryService};

use crate::errors::ApiError;
use crate::service::AppState;

/// POST `/vm-values/query`
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<VmValueRequest>,
) -> Result<Json<GenericApiResponse>, ApiError> {
    let query = to_sc_query(request)?;
    let output = state.sc_query.execute_query(&query).await?;
    Ok(Json(GenericApiResponse::ok(json!({ "data": output }))))
}

fn to_sc_query(request: VmValueRequest) -> Result<ScQuery, ProcessError> {
    let mut arguments = Vec::with_capacity(request.args.len());
    for arg in &request.args {
        let bytes = hex::decode(arg).map_err(|e| ProcessError::InvalidTxFields {
            message: "invalid query argument".to_string(),
            reason: e.to_string(),
        })?;
        arguments.push(bytes);
    }

    Ok(ScQuery {
        sc_address: request.sc_address,
        func_name: request.func_name,
        arguments,
        caller: request.caller,
        value: request.value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments_are_hex_decoded() {
        let request = VmValueRequest {
            sc_address: "erd1contract".to_string(),
            func_name: "getSum".to_string(),
            args: vec!["0102".to_string()],
            caller: None,
            value: None,
        };
        let query = to_sc_query(request).unwrap();
        assert_eq!(query.arguments, vec![vec![0x01, 0x02]]);
    }

    #[test]
    fn test_bad_hex_argument_is_rejected() {
        let request = VmValueRequest {
            sc_address: "erd1contract".to_string(),
            func_name: "getSum".to_string(),
            args: vec!["zz".to_string()],
            caller: None,
            value: None,
        };
        assert!(matches!(
            to_sc_query(request),
            Err(ProcessError::InvalidTxFields { .. })
        ));
    }
}
