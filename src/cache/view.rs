//! Typed cache for read-model views.
//!
//! Reads never fail: backend errors and undecodable values are misses.
//! Writes never fail either; errors are logged and dropped because the
//! durable store has already committed by the time a view is written.

use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use super::CacheStore;

/// JSON-backed cache bound to one view type.
pub struct ViewCache<T> {
    store: Arc<dyn CacheStore>,
    ttl: Option<Duration>,
    _view: PhantomData<fn() -> T>,
}

impl<T> Clone for ViewCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ttl: self.ttl,
            _view: PhantomData,
        }
    }
}

impl<T> ViewCache<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a view cache; `ttl = None` keeps entries until deleted
    pub fn new(store: Arc<dyn CacheStore>, ttl: Option<Duration>) -> Self {
        Self {
            store,
            ttl,
            _view: PhantomData,
        }
    }

    /// Fetch and decode a view; any failure is reported as a miss
    pub async fn get(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "View cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(view) => Some(view),
            Err(e) => {
                tracing::warn!(key, error = %e, "Undecodable cached view, treating as miss");
                None
            }
        }
    }

    /// Store a view under `key`
    pub async fn set(&self, key: &str, view: &T) {
        let raw = match serde_json::to_string(view) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to encode view for cache");
                return;
            }
        };

        if let Err(e) = self.store.set(key, raw, self.ttl).await {
            tracing::warn!(key, error = %e, "View cache write failed");
        }
    }

    /// Store a view read from the durable store on a miss.
    ///
    /// Never replaces a view already cached: a writer may have stored a newer
    /// one after this reader loaded its record.
    pub async fn warm(&self, key: &str, view: &T) {
        let raw = match serde_json::to_string(view) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to encode view for cache");
                return;
            }
        };

        match self.store.set_if_absent(key, raw, self.ttl).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(key, "View cached concurrently, keeping it"),
            Err(e) => tracing::warn!(key, error = %e, "View cache warm failed"),
        }
    }

    /// Remove a view
    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            tracing::warn!(key, error = %e, "View cache delete failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: String,
        count: u32,
    }

    fn sample() -> Sample {
        Sample {
            id: "a".to_string(),
            count: 3,
        }
    }

    #[tokio::test]
    async fn test_round_trip_and_delete() {
        let backend = Arc::new(InMemoryCache::new());
        let cache: ViewCache<Sample> = ViewCache::new(backend.clone(), None);

        assert_eq!(cache.get("sample:a").await, None);
        cache.set("sample:a", &sample()).await;
        assert_eq!(cache.get("sample:a").await, Some(sample()));
        assert_eq!(backend.ttl("sample:a"), None);

        cache.delete("sample:a").await;
        assert_eq!(cache.get("sample:a").await, None);
    }

    #[tokio::test]
    async fn test_corrupt_value_is_a_miss() {
        let backend = Arc::new(InMemoryCache::new());
        backend
            .set("sample:a", "{not json".to_string(), None)
            .await
            .unwrap();

        let cache: ViewCache<Sample> = ViewCache::new(backend, None);
        assert_eq!(cache.get("sample:a").await, None);
    }

    #[tokio::test]
    async fn test_outage_is_swallowed() {
        let backend = Arc::new(InMemoryCache::new());
        let cache: ViewCache<Sample> = ViewCache::new(backend.clone(), None);
        backend.set_unavailable(true);

        cache.set("sample:a", &sample()).await;
        cache.delete("sample:a").await;
        assert_eq!(cache.get("sample:a").await, None);

        backend.set_unavailable(false);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_warm_does_not_replace_newer_view() {
        let backend = Arc::new(InMemoryCache::new());
        let cache: ViewCache<Sample> = ViewCache::new(backend, None);
        let newer = Sample {
            id: "a".to_string(),
            count: 4,
        };

        cache.set("sample:a", &newer).await;
        cache.warm("sample:a", &sample()).await;
        assert_eq!(cache.get("sample:a").await, Some(newer));

        cache.delete("sample:a").await;
        cache.warm("sample:a", &sample()).await;
        assert_eq!(cache.get("sample:a").await, Some(sample()));
    }

    #[tokio::test]
    async fn test_ttl_is_applied() {
        let backend = Arc::new(InMemoryCache::new());
        let cache: ViewCache<Sample> =
            ViewCache::new(backend.clone(), Some(Duration::from_secs(300)));

        cache.set("sample:a", &sample()).await;
        let ttl = backend.ttl("sample:a").unwrap();
        assert!(ttl > Duration::from_secs(290) && ttl <= Duration::from_secs(300));
    }
}
