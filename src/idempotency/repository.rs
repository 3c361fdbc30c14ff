//! Processed-transaction markers
//!
//! A marker `processed:txn:<transactionId>` with value `"1"` records that a
//! transaction's balance delta has been applied. Markers expire, so absence
//! does not prove the transaction is new.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheResult, CacheStore};

/// Key namespace for markers
pub const MARKER_PREFIX: &str = "processed:txn:";

/// Marker lifetime unless configured otherwise
pub const DEFAULT_MARKER_TTL: Duration = Duration::from_secs(72 * 60 * 60);

/// Marker store for processed transactions
#[derive(Clone)]
pub struct ProcessedTransactions {
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ProcessedTransactions {
    /// Create a marker store with the given TTL
    pub fn new(cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Cache key of a transaction's marker
    pub fn key(transaction_id: &str) -> String {
        format!("{}{}", MARKER_PREFIX, transaction_id)
    }

    /// Check whether a marker exists for the transaction
    pub async fn is_processed(&self, transaction_id: &str) -> CacheResult<bool> {
        self.cache.exists(&Self::key(transaction_id)).await
    }

    /// Record the transaction as processed
    pub async fn mark_processed(&self, transaction_id: &str) -> CacheResult<()> {
        self.cache
            .set(&Self::key(transaction_id), "1".to_string(), Some(self.ttl))
            .await
    }
}
