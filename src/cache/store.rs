//! Cache store trait definition.

use async_trait::async_trait;
use std::time::Duration;

use super::CacheResult;

/// Cache store trait for different cache backends.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value from the cache.
    ///
    /// Returns `Ok(Some(value))` if the key exists, `Ok(None)` if not found,
    /// or an error if the operation fails.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a value, optionally expiring after `ttl`.
    ///
    /// `None` stores the key without expiry.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()>;

    /// Set a value only if the key is absent (SET NX).
    ///
    /// Returns `true` if the value was stored.
    async fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> CacheResult<bool>;

    /// Delete a key from the cache. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Check if a key exists in the cache.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Increment a counter, creating it at zero first if missing.
    ///
    /// Returns the new value after incrementing.
    async fn increment(&self, key: &str, delta: i64) -> CacheResult<i64>;

    /// Decrement a counter, creating it at zero first if missing.
    ///
    /// Returns the new value after decrementing.
    async fn decrement(&self, key: &str, delta: i64) -> CacheResult<i64>;
}
