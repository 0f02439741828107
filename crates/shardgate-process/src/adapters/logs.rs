//! Event log merging.
//!
//! A cross-shard transaction leaves event logs on both the source and the
//! destination shard. The merger unions the two, deduplicating events by
//! the hash of their canonical form; the destination copy of a duplicated
//! event wins.

use std::collections::HashSet;
use std::sync::Arc;

use shardgate_data::{ApiLogs, LogEvent};
use tracing::warn;

use crate::ports::{Hasher, LogsMerger, Marshalizer};

/// Hash-deduplicating [`LogsMerger`].
pub struct EventLogsMerger {
    marshalizer: Arc<dyn Marshalizer>,
    hasher: Arc<dyn Hasher>,
}

impl EventLogsMerger {
    /// Merger hashing events under the given marshalizer and hasher.
    pub fn new(marshalizer: Arc<dyn Marshalizer>, hasher: Arc<dyn Hasher>) -> Self {
        Self { marshalizer, hasher }
    }

    fn event_key(&self, event: &LogEvent) -> Option<Vec<u8>> {
        let value = match serde_json::to_value(event) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "cannot serialize log event for dedup");
                return None;
            }
        };
        match self.marshalizer.marshal(&value) {
            Ok(bytes) => Some(self.hasher.compute(&bytes)),
            Err(e) => {
                warn!(error = %e, "cannot marshal log event for dedup");
                None
            }
        }
    }
}

impl LogsMerger for EventLogsMerger {
    fn merge_log_events(
        &self,
        source: Option<&ApiLogs>,
        destination: Option<&ApiLogs>,
    ) -> Option<ApiLogs> {
        match (source, destination) {
            (None, None) => None,
            (Some(source), None) => Some(source.clone()),
            (None, Some(destination)) => Some(destination.clone()),
            (Some(source), Some(destination)) => {
                let mut seen: HashSet<Vec<u8>> = HashSet::new();
                let mut events = Vec::new();

                // Destination first so its copy of a duplicate survives.
                for event in destination.events.iter().chain(source.events.iter()) {
                    match self.event_key(event) {
                        Some(key) => {
                            if seen.insert(key) {
                                events.push(event.clone());
                            }
                        }
                        // Unhashable events are kept rather than dropped.
                        None => events.push(event.clone()),
                    }
                }

                Some(ApiLogs {
                    address: destination.address.clone(),
                    events,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{JsonMarshalizer, Keccak256Hasher};

    fn merger() -> EventLogsMerger {
        EventLogsMerger::new(Arc::new(JsonMarshalizer), Arc::new(Keccak256Hasher))
    }

    fn event(identifier: &str) -> LogEvent {
        LogEvent {
            address: "erd1emitter".to_string(),
            identifier: identifier.to_string(),
            topics: vec!["dG9waWM=".to_string()],
            data: None,
        }
    }

    fn logs(address: &str, identifiers: &[&str]) -> ApiLogs {
        ApiLogs {
            address: address.to_string(),
            events: identifiers.iter().map(|id| event(id)).collect(),
        }
    }

    #[test]
    fn test_one_sided_merges_pass_through() {
        let merger = merger();
        let source = logs("erd1src", &["transfer"]);

        assert_eq!(merger.merge_log_events(Some(&source), None), Some(source.clone()));
        assert_eq!(merger.merge_log_events(None, Some(&source)), Some(source));
        assert_eq!(merger.merge_log_events(None, None), None);
    }

    #[test]
    fn test_union_dedups_identical_events() {
        let merger = merger();
        let source = logs("erd1src", &["transfer", "mint"]);
        let destination = logs("erd1dst", &["transfer", "burn"]);

        let merged = merger
            .merge_log_events(Some(&source), Some(&destination))
            .unwrap();

        assert_eq!(merged.address, "erd1dst");
        let identifiers: Vec<&str> = merged.events.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(identifiers, vec!["transfer", "burn", "mint"]);
    }

    #[test]
    fn test_distinct_events_all_survive() {
        let merger = merger();
        let source = logs("erd1src", &["a", "b"]);
        let destination = logs("erd1dst", &["c"]);

        let merged = merger
            .merge_log_events(Some(&source), Some(&destination))
            .unwrap();
        assert_eq!(merged.events.len(), 3);
    }
}
