//! Cluster-wide metric views.
//!
//! Every operation fans out over a fixed observer scope with first-success
//! failover. The expensive, slow-changing views (network config, enable
//! epochs, economics) sit behind the TTL cache.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use shardgate_data::{GenericApiResponse, NodeData, ShardId, METACHAIN_SHARD_ID};
use tracing::{debug, info};

use crate::errors::ProcessError;
use crate::ports::{CallOutcome, Processor, ResponseCacher};

const NETWORK_CONFIG_PATH: &str = "/network/config";
const NETWORK_ECONOMICS_PATH: &str = "/network/economics";
const ENABLE_EPOCHS_PATH: &str = "/network/enable-epochs";
const ALL_ISSUED_ESDTS_PATH: &str = "/network/esdts";
const DELEGATED_INFO_PATH: &str = "/network/delegated-info";
const DIRECT_STAKED_PATH: &str = "/network/direct-staked-info";

const CACHE_KEY_NETWORK_CONFIG: &str = "network_config";
const CACHE_KEY_ENABLE_EPOCHS: &str = "enable_epochs";
const CACHE_KEY_ECONOMICS: &str = "economics";

/// Per-shard chain tip nonce.
pub const METRIC_NONCE: &str = "erd_nonce";
/// Metachain view of the notarized height of every shard.
pub const METRIC_CROSS_CHECK_BLOCK_HEIGHT: &str = "erd_cross_check_block_height";

/// Aggregated node-status operations.
pub struct NodeStatusProcessor {
    proc: Arc<dyn Processor>,
    cache: Arc<dyn ResponseCacher>,
    cache_validity: Duration,
}

impl NodeStatusProcessor {
    /// Wire the processor. The cache validity window must be non-zero.
    pub fn new(
        proc: Arc<dyn Processor>,
        cache: Arc<dyn ResponseCacher>,
        cache_validity: Duration,
    ) -> Result<Self, ProcessError> {
        if cache_validity.is_zero() {
            return Err(ProcessError::InvalidCacheValidityDuration);
        }

        Ok(Self {
            proc,
            cache,
            cache_validity,
        })
    }

    /// Chain configuration constants, served from cache within the TTL.
    pub async fn network_config_metrics(&self) -> Result<GenericApiResponse, ProcessError> {
        if let Some(hit) = self.cache.load(CACHE_KEY_NETWORK_CONFIG) {
            return Ok(hit);
        }

        let observers = self.proc.all_observers()?;
        let response = self.first_success(&observers, NETWORK_CONFIG_PATH).await?;
        self.cache
            .store(CACHE_KEY_NETWORK_CONFIG, &response, self.cache_validity);
        Ok(response)
    }

    /// Live status metrics of one shard.
    pub async fn network_status_metrics(
        &self,
        shard_id: ShardId,
    ) -> Result<GenericApiResponse, ProcessError> {
        let observers = self.proc.observers(shard_id)?;
        let path = format!("/network/status/{shard_id}");
        self.first_success(&observers, &path).await
    }

    /// Feature activation epochs, served from cache within the TTL.
    pub async fn enable_epochs_metrics(&self) -> Result<GenericApiResponse, ProcessError> {
        if let Some(hit) = self.cache.load(CACHE_KEY_ENABLE_EPOCHS) {
            return Ok(hit);
        }

        let observers = self.proc.all_observers()?;
        let response = self.first_success(&observers, ENABLE_EPOCHS_PATH).await?;
        self.cache
            .store(CACHE_KEY_ENABLE_EPOCHS, &response, self.cache_validity);
        Ok(response)
    }

    /// Economy-wide metrics from the metachain, served from cache within
    /// the TTL.
    pub async fn economics_metrics(&self) -> Result<GenericApiResponse, ProcessError> {
        if let Some(hit) = self.cache.load(CACHE_KEY_ECONOMICS) {
            return Ok(hit);
        }

        let observers = self.proc.observers(METACHAIN_SHARD_ID)?;
        let response = self.first_success(&observers, NETWORK_ECONOMICS_PATH).await?;
        self.cache
            .store(CACHE_KEY_ECONOMICS, &response, self.cache_validity);
        Ok(response)
    }

    /// Identifiers of every issued token, from the metachain.
    pub async fn all_issued_esdts(&self) -> Result<GenericApiResponse, ProcessError> {
        let observers = self.proc.observers(METACHAIN_SHARD_ID)?;
        self.first_success(&observers, ALL_ISSUED_ESDTS_PATH).await
    }

    /// Delegation totals, from the metachain.
    pub async fn delegated_info(&self) -> Result<GenericApiResponse, ProcessError> {
        let observers = self.proc.observers(METACHAIN_SHARD_ID)?;
        self.first_success(&observers, DELEGATED_INFO_PATH).await
    }

    /// Direct staking totals, from the metachain.
    pub async fn direct_staked_info(&self) -> Result<GenericApiResponse, ProcessError> {
        let observers = self.proc.observers(METACHAIN_SHARD_ID)?;
        self.first_success(&observers, DIRECT_STAKED_PATH).await
    }

    /// Highest hyperblock nonce for which every shard's contribution is
    /// known to be final.
    ///
    /// Each worker shard contributes its tip nonce; the metachain
    /// contributes its notarized cross-check height for every shard. The
    /// answer is the minimum over all contributions.
    pub async fn latest_fully_synchronized_hyperblock_nonce(
        &self,
    ) -> Result<u64, ProcessError> {
        let mut nonces: Vec<u64> = Vec::new();

        for shard_id in self.proc.shard_ids() {
            let status = self.network_status_metrics(shard_id).await?;
            let metrics = &status.data["metrics"];

            if shard_id == METACHAIN_SHARD_ID {
                if let Some(cross_check) = metrics[METRIC_CROSS_CHECK_BLOCK_HEIGHT].as_str() {
                    nonces.extend(parse_cross_check_nonces(cross_check));
                }
            }

            if let Some(nonce) = metrics[METRIC_NONCE].as_u64() {
                nonces.push(nonce);
            }
        }

        nonces
            .into_iter()
            .min()
            .ok_or(ProcessError::InvalidStatusMetrics)
    }

    async fn first_success(
        &self,
        observers: &[NodeData],
        path: &str,
    ) -> Result<GenericApiResponse, ProcessError> {
        for observer in observers {
            match self.proc.call_get(&observer.address, path).await {
                CallOutcome::Ok(body) => {
                    info!(observer = %observer.address, path, "node status request served");
                    return decode_envelope(body);
                }
                CallOutcome::Skip { reason, .. } => {
                    debug!(observer = %observer.address, path, reason, "observer skipped");
                }
                CallOutcome::Reject { status, .. } => {
                    debug!(observer = %observer.address, path, %status, "observer rejected");
                }
            }
        }

        Err(ProcessError::SendingRequest)
    }
}

fn decode_envelope(body: Value) -> Result<GenericApiResponse, ProcessError> {
    serde_json::from_value(body).map_err(|_| ProcessError::InvalidStatusMetrics)
}

/// Parse `"0:98 1:95 meta:20"` into the notarized heights.
///
/// Tokens that do not look like `label:nonce` are ignored.
fn parse_cross_check_nonces(value: &str) -> Vec<u64> {
    value
        .split_whitespace()
        .filter_map(|token| token.split_once(':'))
        .filter_map(|(_, nonce)| nonce.trim().parse::<u64>().ok())
        .collect()
}
