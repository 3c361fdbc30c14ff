//! Event Log Errors
//!
//! Transport-level failures of the log. Handler failures are not log errors.

/// Result type for log operations
pub type EventLogResult<T> = Result<T, EventLogError>;

/// Errors that can occur in the event log
#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    /// Consumer group does not exist on the topic
    #[error("No consumer group {group} on {topic}")]
    NoGroup { topic: String, group: String },

    /// Redis command failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Could not connect to the backend
    #[error("Event log connection error: {0}")]
    Connection(String),

    /// Envelope could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend refused the operation
    #[error("Event log unavailable")]
    Unavailable,
}

impl EventLogError {
    /// Check if the backend reported that the consumer group already exists
    pub fn is_busy_group(&self) -> bool {
        match self {
            EventLogError::Redis(e) => e.code() == Some("BUSYGROUP"),
            _ => false,
        }
    }

    /// Check if retrying the same call later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EventLogError::Redis(_) | EventLogError::Connection(_) | EventLogError::Unavailable
        )
    }
}
