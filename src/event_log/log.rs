//! Event log contract

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::{EventEnvelope, Topic};

use super::EventLogResult;

/// An entry read from a topic
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub topic: Topic,
    /// Backend entry id, unique and increasing within the topic
    pub id: String,
    /// Serialized envelope as appended
    pub body: String,
}

impl LogEntry {
    /// Decode the envelope carried by this entry
    pub fn envelope(&self) -> Result<EventEnvelope, serde_json::Error> {
        EventEnvelope::from_json(&self.body)
    }
}

/// Parameters of a consumer-group read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Maximum number of entries returned
    pub count: usize,
    /// How long to wait for new entries when none are ready
    pub block: Duration,
    /// Pending entries idle at least this long are claimed and redelivered
    pub claim_idle: Duration,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            count: 10,
            block: Duration::from_secs(5),
            claim_idle: Duration::from_secs(30),
        }
    }
}

/// Append-only log with consumer groups.
///
/// Within one topic a group sees entries in append order. An entry handed to
/// a consumer stays pending until acknowledged; once it has been pending for
/// `claim_idle` the next read on the group returns it again, ahead of new
/// entries.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append a serialized envelope; returns the entry id
    async fn append(&self, topic: Topic, body: &str) -> EventLogResult<String>;

    /// Create the group at the start of the topic if it does not exist.
    /// An existing group is left untouched and is not an error.
    async fn ensure_group(&self, topic: Topic, group: &str) -> EventLogResult<()>;

    /// Claim stale pending entries, then deliver new ones. Returns an empty
    /// batch when nothing arrives within `options.block`.
    async fn read_group(
        &self,
        topic: Topic,
        group: &str,
        consumer: &str,
        options: &ReadOptions,
    ) -> EventLogResult<Vec<LogEntry>>;

    /// Acknowledge an entry, removing it from the group's pending set
    async fn ack(&self, topic: Topic, group: &str, entry_id: &str) -> EventLogResult<()>;
}
