//! Projection Errors
//!
//! Any error returned by a projector leaves the entry unacknowledged.

use crate::cache::CacheError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// Target account does not exist (or was deleted)
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Payload does not match the event type
    #[error("Invalid event payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl ProjectionError {
    /// Map a store error, keeping account lookups distinguishable
    pub(crate) fn from_account_lookup(err: StoreError, account_number: &str) -> Self {
        if err.is_not_found() {
            ProjectionError::AccountNotFound(account_number.to_string())
        } else {
            ProjectionError::Store(err)
        }
    }
}
