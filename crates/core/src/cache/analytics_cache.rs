//! Read-through cache of computed snapshots, keyed by owner and metric.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::CacheStoreTrait;
use crate::errors::Result;

/// Kind of cached snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Allocation,
    Performance,
    Risk,
    /// The full portfolio aggregate.
    Portfolio,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Allocation,
        MetricKind::Performance,
        MetricKind::Risk,
        MetricKind::Portfolio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Allocation => "allocation",
            MetricKind::Performance => "performance",
            MetricKind::Risk => "risk",
            MetricKind::Portfolio => "portfolio",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn cache_key(owner_id: &str, kind: MetricKind) -> String {
    format!("portfolio:{}:{}", owner_id, kind)
}

/// Snapshot cache over an injected `CacheStoreTrait`.
///
/// Store failures never fail a request: a failed read is a miss and a failed
/// write is logged and dropped. Concurrent misses on the same key each
/// compute independently.
#[derive(Clone)]
pub struct AnalyticsCache {
    store: Arc<dyn CacheStoreTrait>,
    ttl: Duration,
}

impl AnalyticsCache {
    pub fn new(store: Arc<dyn CacheStoreTrait>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn get<T: DeserializeOwned>(&self, owner_id: &str, kind: MetricKind) -> Option<T> {
        let key = cache_key(owner_id, kind);
        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed for {}: {}. Treating as a miss.", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }

    pub async fn put<T: Serialize>(&self, owner_id: &str, kind: MetricKind, value: &T) {
        let key = cache_key(owner_id, kind);
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to encode cache entry {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.store.set(&key, raw, self.ttl).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }

    /// Returns the cached value when present, otherwise runs `compute`,
    /// stores its result and returns it. Errors from `compute` are returned
    /// and nothing is stored.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        owner_id: &str,
        kind: MetricKind,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.get(owner_id, kind).await {
            debug!("Cache hit for {} {}", owner_id, kind);
            return Ok(hit);
        }
        debug!("Cache miss for {} {}, computing", owner_id, kind);
        let value = compute().await?;
        self.put(owner_id, kind, &value).await;
        Ok(value)
    }

    /// Deletes every cached snapshot of `owner_id`.
    pub async fn invalidate_owner(&self, owner_id: &str) {
        for kind in MetricKind::ALL {
            let key = cache_key(owner_id, kind);
            if let Err(e) = self.store.delete(&key).await {
                warn!("Cache delete failed for {}: {}", key, e);
            }
        }
        debug!("Invalidated cached analytics for {}", owner_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::errors::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> (Arc<MemoryCacheStore>, AnalyticsCache) {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = AnalyticsCache::new(store.clone(), Duration::from_secs(300));
        (store, cache)
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let (_, cache) = cache();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: u32 = cache
                .get_or_compute("owner", MetricKind::Risk, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn compute_error_is_not_cached() {
        let (store, cache) = cache();
        let result: Result<u32> = cache
            .get_or_compute("owner", MetricKind::Risk, || async {
                Err(Error::InsufficientData("none".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn invalidate_owner_clears_every_kind_of_that_owner_only() {
        let (store, cache) = cache();
        for kind in MetricKind::ALL {
            cache.put("a", kind, &1u8).await;
        }
        cache.put("b", MetricKind::Allocation, &2u8).await;

        cache.invalidate_owner("a").await;

        for kind in MetricKind::ALL {
            assert_eq!(cache.get::<u8>("a", kind).await, None);
        }
        assert_eq!(cache.get::<u8>("b", MetricKind::Allocation).await, Some(2));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_miss() {
        let (store, cache) = cache();
        store
            .set(
                &cache_key("owner", MetricKind::Performance),
                "not json".to_string(),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        assert_eq!(cache.get::<u32>("owner", MetricKind::Performance).await, None);
    }

    struct FailingStore;

    #[async_trait]
    impl CacheStoreTrait for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Cache("down".to_string()))
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<()> {
            Err(Error::Cache("down".to_string()))
        }
        async fn delete(&self, _key: &str) -> Result<()> {
            Err(Error::Cache("down".to_string()))
        }
    }

    #[tokio::test]
    async fn store_failures_fall_back_to_compute() {
        let cache = AnalyticsCache::new(Arc::new(FailingStore), Duration::from_secs(1));
        let value: u32 = cache
            .get_or_compute("owner", MetricKind::Allocation, || async { Ok(3) })
            .await
            .unwrap();
        assert_eq!(value, 3);
        cache.invalidate_owner("owner").await;
    }

    #[test]
    fn keys_are_namespaced_by_owner_and_kind() {
        assert_eq!(
            cache_key("u-1", MetricKind::Performance),
            "portfolio:u-1:performance"
        );
    }
}
