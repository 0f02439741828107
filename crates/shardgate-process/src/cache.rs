//! TTL cache for cluster-wide metric views.
//!
//! One entry per metric key, expiring `ttl` after the put. There is no
//! eviction thread; an expired entry simply reads as a miss and stays in
//! place until the next overwrite.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use shardgate_data::GenericApiResponse;

use crate::ports::ResponseCacher;

struct CacheEntry {
    response: GenericApiResponse,
    expires_at: Instant,
}

/// In-memory, per-key TTL cache.
#[derive(Default)]
pub struct MetricsCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MetricsCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseCacher for MetricsCache {
    fn load(&self, key: &str) -> Option<GenericApiResponse> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.response.clone())
    }

    fn store(&self, key: &str, response: &GenericApiResponse, ttl: Duration) {
        let entry = CacheEntry {
            response: response.clone(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key.to_string(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_miss_on_empty_cache() {
        let cache = MetricsCache::new();
        assert!(cache.load("economics").is_none());
    }

    #[test]
    fn test_hit_within_ttl_returns_last_put() {
        let cache = MetricsCache::new();
        let first = GenericApiResponse::ok(json!({"metric": 1}));
        let second = GenericApiResponse::ok(json!({"metric": 2}));

        cache.store("economics", &first, Duration::from_secs(60));
        cache.store("economics", &second, Duration::from_secs(60));

        assert_eq!(cache.load("economics"), Some(second));
    }

    #[test]
    fn test_expired_entry_reads_as_miss() {
        let cache = MetricsCache::new();
        let response = GenericApiResponse::ok(json!({"metric": 1}));

        cache.store("economics", &response, Duration::from_millis(0));
        assert!(cache.load("economics").is_none());
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = MetricsCache::new();
        let response = GenericApiResponse::ok(json!({"metric": 1}));

        cache.store("economics", &response, Duration::from_secs(60));
        assert!(cache.load("network_config").is_none());
        assert!(cache.load("economics").is_some());
    }
}
