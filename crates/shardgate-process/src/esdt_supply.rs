//! Token supply aggregation.
//!
//! The total supply of a token is scattered over the worker shards. The
//! processor sums the per-shard figures and, for fungible tokens, adds the
//! initial supply recorded by the token system contract on the metachain.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use num_bigint::BigUint;
use num_traits::Zero;
use shardgate_data::{
    EsdtSupplyData, EsdtSupplyResponse, ScQuery, ShardId, METACHAIN_SHARD_ID,
};
use tracing::{info, warn};

use crate::errors::ProcessError;
use crate::ports::{CallOutcome, Processor, ScQueryService};

/// Bech32 address of the token system contract on the metachain.
pub const ESDT_CONTRACT_ADDRESS: &str =
    "erd1qqqqqqqqqqqqqqqpqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqzllls8a5w6u";

const INITIAL_SUPPLY_FUNC: &str = "getTokenProperties";
const NETWORK_ESDT_SUPPLY_PATH: &str = "/network/esdt/supply/";

/// Position of the initial supply inside `getTokenProperties` return data.
const INITIAL_SUPPLY_INDEX: usize = 3;

/// Cluster-wide token supply aggregation.
pub struct EsdtSupplyProcessor {
    proc: Arc<dyn Processor>,
    sc_query: Arc<dyn ScQueryService>,
}

impl EsdtSupplyProcessor {
    /// Wire the processor over the base processor and the SC query service.
    pub fn new(proc: Arc<dyn Processor>, sc_query: Arc<dyn ScQueryService>) -> Self {
        Self { proc, sc_query }
    }

    /// Total supply of `token` across the cluster.
    pub async fn get_esdt_supply(
        &self,
        token: &str,
    ) -> Result<EsdtSupplyResponse, ProcessError> {
        let mut total = self.supply_from_shards(token).await?;

        if is_fungible(token) {
            total += self.initial_supply_from_meta(token).await?;
        }

        Ok(EsdtSupplyResponse {
            data: EsdtSupplyData {
                supply: total.to_string(),
            },
            ..EsdtSupplyResponse::default()
        })
    }

    async fn supply_from_shards(&self, token: &str) -> Result<BigUint, ProcessError> {
        let mut total = BigUint::zero();
        for shard_id in self.proc.shard_ids() {
            if shard_id == METACHAIN_SHARD_ID {
                continue;
            }
            total += self.shard_supply(token, shard_id).await?;
        }
        Ok(total)
    }

    async fn shard_supply(&self, token: &str, shard_id: ShardId) -> Result<BigUint, ProcessError> {
        let observers = self.proc.observers(shard_id)?;
        let path = format!("{NETWORK_ESDT_SUPPLY_PATH}{token}");

        for observer in &observers {
            let value = match self.proc.call_get(&observer.address, &path).await {
                CallOutcome::Ok(value) => value,
                CallOutcome::Skip { reason, .. } => {
                    warn!(observer = %observer.address, token, reason, "esdt supply request failed");
                    continue;
                }
                CallOutcome::Reject { status, .. } => {
                    warn!(observer = %observer.address, token, %status, "esdt supply request rejected");
                    continue;
                }
            };

            let response: EsdtSupplyResponse = match serde_json::from_value(value) {
                Ok(response) => response,
                Err(e) => {
                    warn!(observer = %observer.address, token, error = %e, "malformed esdt supply body");
                    continue;
                }
            };

            info!(shard = shard_id, observer = %observer.address, token, "esdt supply request");

            return Ok(parse_supply(&response.data.supply, token));
        }

        Err(ProcessError::SendingRequest)
    }

    async fn initial_supply_from_meta(&self, token: &str) -> Result<BigUint, ProcessError> {
        let query = ScQuery::new(ESDT_CONTRACT_ADDRESS, INITIAL_SUPPLY_FUNC)
            .with_argument(token.as_bytes().to_vec());

        let output = self.sc_query.execute_query(&query).await?;
        if output.return_data.len() <= INITIAL_SUPPLY_INDEX {
            return Ok(BigUint::zero());
        }

        let raw = &output.return_data[INITIAL_SUPPLY_INDEX];
        let decoded = match BASE64.decode(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(token, error = %e, "initial supply entry is not base64");
                return Ok(BigUint::zero());
            }
        };

        Ok(parse_supply(&String::from_utf8_lossy(&decoded), token))
    }
}

/// Token identifiers have the shape `TICKER-random[-nonce]`; anything with
/// fewer than three dash-separated parts is a fungible token.
fn is_fungible(token: &str) -> bool {
    token.split('-').count() < 3
}

fn parse_supply(supply: &str, token: &str) -> BigUint {
    if supply.is_empty() {
        return BigUint::zero();
    }
    match BigUint::parse_bytes(supply.as_bytes(), 10) {
        Some(parsed) => parsed,
        None => {
            warn!(token, supply, "unparseable supply value, counting as zero");
            BigUint::zero()
        }
    }
}
