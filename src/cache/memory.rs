//! In-memory cache implementation.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::{CacheError, CacheResult, CacheStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process-local cache with per-key expiry.
///
/// `set_unavailable(true)` makes every operation fail, which is how tests
/// simulate a cache outage.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    unavailable: AtomicBool,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated outage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Remaining lifetime of a key; `None` if missing or without expiry
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    /// Drop every key, as a cache flush would
    pub fn flush(&self) {
        self.entries.lock().clear();
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> CacheResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable);
        }
        Ok(())
    }

    fn add(&self, key: &str, delta: i64) -> CacheResult<i64> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let (current, expires_at) = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                let current: i64 = entry
                    .value
                    .parse()
                    .map_err(|_| CacheError::NotAnInteger(key.to_string()))?;
                (current, entry.expires_at)
            }
            _ => (0, None),
        };

        let next = current + delta;
        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        self.check_available()?;
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .lock()
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> CacheResult<bool> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|e| !e.is_expired(now)) {
            return Ok(false);
        }

        let expires_at = ttl.map(|ttl| now + ttl);
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(true)
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.check_available()?;
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn increment(&self, key: &str, delta: i64) -> CacheResult<i64> {
        self.add(key, delta)
    }

    async fn decrement(&self, key: &str, delta: i64) -> CacheResult<i64> {
        self.add(key, -delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryCache::new();
        cache.set("k", "v".to_string(), None).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        assert!(cache.exists("k").await.unwrap());
        assert_eq!(cache.ttl("k"), None);

        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        cache.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_key_is_a_miss() {
        let cache = InMemoryCache::new();
        cache
            .set("short", "1".to_string(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(!cache.exists("short").await.unwrap());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_counters() {
        let cache = InMemoryCache::new();
        assert_eq!(cache.increment("c", 1).await.unwrap(), 1);
        assert_eq!(cache.increment("c", 2).await.unwrap(), 3);
        assert_eq!(cache.decrement("c", 1).await.unwrap(), 2);
        assert_eq!(cache.decrement("missing", 1).await.unwrap(), -1);

        cache.set("text", "abc".to_string(), None).await.unwrap();
        assert!(matches!(
            cache.increment("text", 1).await,
            Err(CacheError::NotAnInteger(_))
        ));
    }

    #[tokio::test]
    async fn test_set_if_absent_keeps_existing_value() {
        let cache = InMemoryCache::new();
        assert!(cache.set_if_absent("k", "first".to_string(), None).await.unwrap());
        assert!(!cache.set_if_absent("k", "second".to_string(), None).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), Some("first".to_string()));

        cache
            .set("short", "old".to_string(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.set_if_absent("short", "new".to_string(), None).await.unwrap());
        assert_eq!(cache.get("short").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_unavailable_cache_fails_every_call() {
        let cache = InMemoryCache::new();
        cache.set_unavailable(true);

        assert!(matches!(cache.get("k").await, Err(CacheError::Unavailable)));
        assert!(cache.set("k", "v".to_string(), None).await.is_err());

        cache.set_unavailable(false);
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
