//! Redis cache implementation.

use async_trait::async_trait;
use redis::{
    aio::ConnectionManager, AsyncCommands, Client, ExistenceCheck, SetExpiry, SetOptions,
};
use std::time::Duration;

use super::{CacheError, CacheResult, CacheStore};

/// Redis cache store.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis at `url`
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = Client::open(url).map_err(|e| CacheError::Connection(e.to_string()))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.connection.clone();

        match ttl {
            // SET EX rejects zero; keep sub-second TTLs alive for one second
            Some(ttl) => {
                let seconds = ttl.as_secs().max(1);
                let _: () = conn.set_ex(key, value, seconds).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }

        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> CacheResult<bool> {
        let mut conn = self.connection.clone();

        let mut options = SetOptions::default().conditional_set(ExistenceCheck::NX);
        if let Some(ttl) = ttl {
            options = options.with_expiration(SetExpiry::EX(ttl.as_secs().max(1)));
        }

        // Nil when the key already exists
        let stored: Option<String> = conn.set_options(key, value, options).await?;
        Ok(stored.is_some())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn increment(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let mut conn = self.connection.clone();
        let value: i64 = conn.incr(key, delta).await?;
        Ok(value)
    }

    async fn decrement(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let mut conn = self.connection.clone();
        let value: i64 = conn.decr(key, delta).await?;
        Ok(value)
    }
}
