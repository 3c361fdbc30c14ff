//! Cache Errors

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised by a cache backend
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Could not reach the backend
    #[error("Cache connection error: {0}")]
    Connection(String),

    /// Redis command failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Stored value is not a valid counter
    #[error("Value at {0} is not an integer")]
    NotAnInteger(String),

    /// Backend refused the operation
    #[error("Cache unavailable")]
    Unavailable,
}
