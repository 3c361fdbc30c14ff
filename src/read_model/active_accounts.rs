//! Open-account guard
//!
//! Answers "does this user still have open accounts?" for user deletion.
//! `StoreActiveAccounts` asks the account store directly. The
//! `CachedAccountCounter` keeps an event-derived count in the cache instead:
//! it only reflects account events the user-side consumer has already
//! acknowledged, so it can lag behind the store.

use async_trait::async_trait;
use std::sync::Arc;

use crate::cache::{CacheError, CacheStore};
use crate::store::{AccountStore, StoreError};

/// Key namespace for per-user open-account counters
pub const ACCOUNT_COUNT_PREFIX: &str = "user:accounts:";

/// `user:accounts:<userId>`
pub fn account_count_key(user_id: &str) -> String {
    format!("{}{}", ACCOUNT_COUNT_PREFIX, user_id)
}

#[derive(Debug, thiserror::Error)]
pub enum ActiveAccountsError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Open-account lookup used by the user delete guard
#[async_trait]
pub trait ActiveAccounts: Send + Sync {
    async fn has_active_accounts(&self, user_id: &str) -> Result<bool, ActiveAccountsError>;
}

/// Counts live accounts in the account store
#[derive(Clone)]
pub struct StoreActiveAccounts {
    accounts: Arc<dyn AccountStore>,
}

impl StoreActiveAccounts {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl ActiveAccounts for StoreActiveAccounts {
    async fn has_active_accounts(&self, user_id: &str) -> Result<bool, ActiveAccountsError> {
        Ok(self.accounts.count_active_by_user(user_id).await? > 0)
    }
}

/// Event-derived open-account counter
#[derive(Clone)]
pub struct CachedAccountCounter {
    cache: Arc<dyn CacheStore>,
}

impl CachedAccountCounter {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// Count one more open account; returns the new count
    pub async fn account_opened(&self, user_id: &str) -> Result<i64, CacheError> {
        self.cache.increment(&account_count_key(user_id), 1).await
    }

    /// Count one fewer open account; returns the new count
    pub async fn account_closed(&self, user_id: &str) -> Result<i64, CacheError> {
        self.cache.decrement(&account_count_key(user_id), 1).await
    }

    /// Current count, zero when no counter exists
    pub async fn count(&self, user_id: &str) -> Result<i64, CacheError> {
        let key = account_count_key(user_id);
        match self.cache.get(&key).await? {
            Some(raw) => raw.parse().map_err(|_| CacheError::NotAnInteger(key)),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl ActiveAccounts for CachedAccountCounter {
    async fn has_active_accounts(&self, user_id: &str) -> Result<bool, ActiveAccountsError> {
        Ok(self.count(user_id).await? > 0)
    }
}
