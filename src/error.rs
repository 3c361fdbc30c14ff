//! Error handling module
//!
//! Centralized error type for command and query services.

use crate::read_model::ActiveAccountsError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Server errors (5xx)
    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, .. } => AppError::NotFound(entity.to_string()),
            StoreError::Duplicate { entity, key } => {
                AppError::Conflict(format!("{} already exists: {}", entity, key))
            }
            other => AppError::Store(other),
        }
    }
}

impl From<ActiveAccountsError> for AppError {
    fn from(err: ActiveAccountsError) -> Self {
        match err {
            ActiveAccountsError::Store(e) => AppError::from(e),
            ActiveAccountsError::Cache(e) => AppError::Internal(e.to_string()),
        }
    }
}
