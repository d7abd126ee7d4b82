//! Result Cache
//!
//! Holds the latest published aggregate so a listener that connects between
//! ticks gets a value immediately instead of waiting for the next event.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::entities::{CachedMetrics, MetricsSnapshot};
use crate::domain::ports::KeyValueStore;
use crate::error::StoreError;

/// Storage key of the published aggregate
pub const METRICS_KEY: &str = "metrics";

pub struct ResultCache<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
}

impl<S: KeyValueStore + ?Sized> ResultCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Read the cached aggregate, surfacing storage errors
    pub async fn try_latest(&self) -> Result<Option<CachedMetrics>, StoreError> {
        match self.store.get(METRICS_KEY).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Read the cached aggregate; storage trouble reads as "nothing cached yet"
    pub async fn latest(&self) -> Option<CachedMetrics> {
        match self.try_latest().await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::error!(error = %e, "Unable to read cached metrics");
                None
            }
        }
    }

    /// Replace the cached aggregate. Best effort: failures are logged only.
    pub async fn publish(&self, metrics: MetricsSnapshot) -> CachedMetrics {
        let cached = CachedMetrics {
            metrics,
            updated_at: Utc::now(),
        };

        match serde_json::to_value(&cached) {
            Ok(value) => {
                if let Err(e) = self.store.put(METRICS_KEY, value).await {
                    tracing::error!(error = %e, "Unable to store published metrics");
                }
            }
            Err(e) => tracing::error!(error = %e, "Unable to serialize published metrics"),
        }

        cached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FailingStore, InMemoryStore};

    fn snapshot(commits: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            commits,
            ..MetricsSnapshot::zero()
        }
    }

    #[tokio::test]
    async fn empty_cache_has_nothing() {
        let cache = ResultCache::new(Arc::new(InMemoryStore::new()));
        assert!(cache.latest().await.is_none());
    }

    #[tokio::test]
    async fn publish_replaces_previous_value() {
        let cache = ResultCache::new(Arc::new(InMemoryStore::new()));

        cache.publish(snapshot(1)).await;
        let second = cache.publish(snapshot(2)).await;

        let latest = cache.latest().await.unwrap();
        assert_eq!(latest.metrics, snapshot(2));
        assert_eq!(latest, second);
    }

    #[tokio::test]
    async fn stored_form_uses_wire_field_names() {
        let store = Arc::new(InMemoryStore::new());
        let cache = ResultCache::new(store.clone());

        cache.publish(snapshot(7)).await;

        let value = store.value(METRICS_KEY).unwrap();
        assert_eq!(value["metrics"]["commits"], 7);
        assert_eq!(value["metrics"]["mergedPRs"], 0);
    }

    #[tokio::test]
    async fn unavailable_store_reads_as_empty() {
        let cache = ResultCache::new(Arc::new(FailingStore));

        let published = cache.publish(snapshot(3)).await;
        assert_eq!(published.metrics, snapshot(3));

        assert!(cache.latest().await.is_none());
        assert!(cache.try_latest().await.is_err());
    }
}
