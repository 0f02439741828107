//! Proxy configuration with validation.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};
use shardgate_data::{NodeData, ShardId, METACHAIN_SHARD_ID};

/// Top-level proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Regular observers, in failover trial order per shard.
    pub observers: Vec<ObserverEntry>,
    /// Full-history observers, in failover trial order per shard.
    pub full_history_nodes: Vec<ObserverEntry>,
    /// Validity window of the cached cluster metrics, in seconds.
    pub metrics_cache_ttl_secs: u64,
    /// Allow clients to fetch the entire cluster transaction pool.
    pub should_allow_entire_tx_pool_fetch: bool,
    /// Account address codec settings.
    pub pubkey: PubkeyConfig,
    /// Hasher identifier for canonical transaction hashing.
    pub hasher: String,
    /// Marshalizer identifier for canonical transaction hashing.
    pub marshalizer: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            observers: Vec::new(),
            full_history_nodes: Vec::new(),
            metrics_cache_ttl_secs: 30,
            should_allow_entire_tx_pool_fetch: false,
            pubkey: PubkeyConfig::default(),
            hasher: "keccak".to_string(),
            marshalizer: "json".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address of the proxy.
    pub bind: SocketAddr,
    /// Per-observer-call timeout, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8079),
            request_timeout_secs: 10,
        }
    }
}

/// One configured observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverEntry {
    /// Base URL of the observer's REST API.
    pub address: String,
    /// Shard the observer serves. `"metachain"` is accepted as an alias
    /// for the metachain shard ID.
    pub shard_id: ShardIdValue,
}

/// Shard ID that also accepts the `"metachain"` literal in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShardIdValue {
    /// Numeric shard ID.
    Number(ShardId),
    /// Named alias.
    Name(ShardName),
}

/// Named shard aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShardName {
    /// The coordinating shard.
    Metachain,
}

impl ShardIdValue {
    /// Numeric value of the shard ID.
    pub fn as_shard_id(&self) -> ShardId {
        match self {
            ShardIdValue::Number(id) => *id,
            ShardIdValue::Name(ShardName::Metachain) => METACHAIN_SHARD_ID,
        }
    }
}

/// Address codec settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PubkeyConfig {
    /// Human-readable bech32 prefix.
    pub hrp: String,
    /// Decoded public key length in bytes.
    pub length: usize,
}

impl Default for PubkeyConfig {
    fn default() -> Self {
        Self {
            hrp: "erd".to_string(),
            length: 32,
        }
    }
}

/// Configuration loading and validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML.
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// No observer configured at all.
    #[error("no observers configured")]
    NoObservers,
    /// No metachain observer configured.
    #[error("no metachain observer configured")]
    NoMetachainObserver,
    /// A worker shard between zero and the highest configured one has no
    /// observer.
    #[error("no observer configured for worker shard {0}")]
    MissingWorkerShard(ShardId),
    /// A scalar setting is out of range.
    #[error("invalid setting: {0}")]
    Invalid(String),
}

impl ProxyConfig {
    /// Load and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: ProxyConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.observers.is_empty() {
            return Err(ConfigError::NoObservers);
        }
        if self.num_worker_shards() == 0 {
            return Err(ConfigError::Invalid(
                "at least one worker shard observer is required".to_string(),
            ));
        }
        if !self
            .observers
            .iter()
            .any(|o| o.shard_id.as_shard_id() == METACHAIN_SHARD_ID)
        {
            return Err(ConfigError::NoMetachainObserver);
        }
        for shard in 0..self.num_worker_shards() {
            if !self
                .observers
                .iter()
                .any(|o| o.shard_id.as_shard_id() == shard)
            {
                return Err(ConfigError::MissingWorkerShard(shard));
            }
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs cannot be 0".to_string(),
            ));
        }
        if self.metrics_cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "metrics_cache_ttl_secs cannot be 0".to_string(),
            ));
        }
        if self.pubkey.length == 0 {
            return Err(ConfigError::Invalid("pubkey.length cannot be 0".to_string()));
        }

        Ok(())
    }

    /// Number of worker shards covered by the observer list.
    pub fn num_worker_shards(&self) -> u32 {
        self.observers
            .iter()
            .map(|o| o.shard_id.as_shard_id())
            .filter(|id| *id != METACHAIN_SHARD_ID)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    /// Regular observer descriptors, in configured order.
    pub fn observer_nodes(&self) -> Vec<NodeData> {
        self.observers
            .iter()
            .map(|o| NodeData::new(o.address.clone(), o.shard_id.as_shard_id()))
            .collect()
    }

    /// Full-history observer descriptors, in configured order.
    pub fn full_history_node_list(&self) -> Vec<NodeData> {
        self.full_history_nodes
            .iter()
            .map(|o| NodeData::full_history(o.address.clone(), o.shard_id.as_shard_id()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(address: &str, shard_id: ShardIdValue) -> ObserverEntry {
        ObserverEntry {
            address: address.to_string(),
            shard_id,
        }
    }

    fn valid_config() -> ProxyConfig {
        ProxyConfig {
            observers: vec![
                entry("http://obs-0:8080", ShardIdValue::Number(0)),
                entry("http://obs-1:8080", ShardIdValue::Number(1)),
                entry("http://obs-meta:8080", ShardIdValue::Name(ShardName::Metachain)),
            ],
            ..ProxyConfig::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
        assert_eq!(valid_config().num_worker_shards(), 2);
    }

    #[test]
    fn test_empty_observers_rejected() {
        let config = ProxyConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::NoObservers)));
    }

    #[test]
    fn test_missing_metachain_rejected() {
        let mut config = valid_config();
        config.observers.pop();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NoMetachainObserver)
        ));
    }

    #[test]
    fn test_worker_shard_gap_rejected() {
        let config = ProxyConfig {
            observers: vec![
                entry("http://obs-0:8080", ShardIdValue::Number(0)),
                entry("http://obs-2:8080", ShardIdValue::Number(2)),
                entry("http://obs-meta:8080", ShardIdValue::Name(ShardName::Metachain)),
            ],
            ..ProxyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingWorkerShard(1))
        ));
    }

    #[test]
    fn test_parses_toml_with_metachain_alias() {
        let raw = r#"
            metrics_cache_ttl_secs = 6
            should_allow_entire_tx_pool_fetch = true

            [server]
            bind = "127.0.0.1:8079"
            request_timeout_secs = 5

            [pubkey]
            hrp = "erd"
            length = 32

            [[observers]]
            address = "http://obs-0:8080"
            shard_id = 0

            [[observers]]
            address = "http://obs-meta:8080"
            shard_id = "metachain"

            [[full_history_nodes]]
            address = "http://hist-0:8080"
            shard_id = 0
        "#;

        let config: ProxyConfig = toml::from_str(raw).unwrap();
        config.validate().unwrap();

        assert_eq!(config.num_worker_shards(), 1);
        assert!(config.should_allow_entire_tx_pool_fetch);
        assert_eq!(config.metrics_cache_ttl_secs, 6);

        let nodes = config.observer_nodes();
        assert_eq!(nodes[1].shard_id, METACHAIN_SHARD_ID);

        let history = config.full_history_node_list();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].address, "http://hist-0:8080");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = valid_config();
        config.server.request_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
