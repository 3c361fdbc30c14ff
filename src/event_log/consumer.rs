//! Consumer-group loop
//!
//! A consumer owns one group cursor on one topic and feeds every entry to a
//! single handler. Entries are acknowledged only after the handler succeeds;
//! anything else stays pending and comes back once it has been idle for
//! `claim_idle`.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::domain::{EventEnvelope, Topic};

use super::{EventLog, EventLogError, LogEntry, ReadOptions};

// =========================================================================
// Configuration
// =========================================================================

/// Consumer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub topic: Topic,
    pub group: String,
    /// Consumer name within the group
    pub consumer: String,
    pub batch_size: usize,
    pub block: Duration,
    pub claim_idle: Duration,
    /// Pause after a failed read
    pub retry_backoff: Duration,
}

impl ConsumerConfig {
    pub fn new(topic: Topic, group: impl Into<String>, consumer: impl Into<String>) -> Self {
        Self {
            topic,
            group: group.into(),
            consumer: consumer.into(),
            batch_size: 10,
            block: Duration::from_secs(5),
            claim_idle: Duration::from_secs(30),
            retry_backoff: Duration::from_secs(1),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_block(mut self, block: Duration) -> Self {
        self.block = block;
        self
    }

    pub fn with_claim_idle(mut self, claim_idle: Duration) -> Self {
        self.claim_idle = claim_idle;
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    fn read_options(&self) -> ReadOptions {
        ReadOptions {
            count: self.batch_size,
            block: self.block,
            claim_idle: self.claim_idle,
        }
    }
}

// =========================================================================
// Handler & errors
// =========================================================================

/// Handles one decoded envelope. `Ok` acknowledges the entry.
#[async_trait]
pub trait EventHandler: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn handle(&self, envelope: &EventEnvelope) -> Result<(), Self::Error>;
}

/// Why a consumer loop stopped
#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    /// Consumer group could not be created
    #[error("Failed to set up consumer group: {0}")]
    GroupSetup(#[source] EventLogError),

    /// Shutdown was signalled
    #[error("Consumer cancelled")]
    Cancelled,
}

/// Observable lifecycle of a consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Running,
    Stopped,
}

impl ConsumerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumerState::Running => "running",
            ConsumerState::Stopped => "stopped",
        }
    }
}

// =========================================================================
// Consumer
// =========================================================================

/// Consumer loop bound to one topic, group and handler
pub struct Consumer<H> {
    log: Arc<dyn EventLog>,
    handler: Arc<H>,
    config: ConsumerConfig,
    state: watch::Sender<ConsumerState>,
}

impl<H: EventHandler> Consumer<H> {
    pub fn new(log: Arc<dyn EventLog>, handler: Arc<H>, config: ConsumerConfig) -> Self {
        let (state, _) = watch::channel(ConsumerState::Stopped);
        Self {
            log,
            handler,
            config,
            state,
        }
    }

    /// Subscribe to lifecycle changes
    pub fn state(&self) -> watch::Receiver<ConsumerState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Run until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// Returns `Err(ConsumerError::Cancelled)` on shutdown. A handler that is
    /// already running is allowed to finish its batch.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), ConsumerError> {
        let topic = self.config.topic;
        let group = self.config.group.as_str();
        let consumer = self.config.consumer.as_str();

        self.log
            .ensure_group(topic, group)
            .await
            .map_err(ConsumerError::GroupSetup)?;

        self.state.send_replace(ConsumerState::Running);
        tracing::info!(topic = %topic, group, consumer, "Consumer started");

        let options = self.config.read_options();
        let result = loop {
            if *shutdown.borrow() {
                break Err(ConsumerError::Cancelled);
            }

            let read = tokio::select! {
                read = self.log.read_group(topic, group, consumer, &options) => read,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break Err(ConsumerError::Cancelled);
                    }
                    continue;
                }
            };

            let batch = match read {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::warn!(
                        topic = %topic,
                        group,
                        error = %e,
                        "Failed to read from event log, backing off"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.retry_backoff) => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                break Err(ConsumerError::Cancelled);
                            }
                        }
                    }
                    continue;
                }
            };

            for entry in &batch {
                self.process(entry).await;
            }
        };

        self.state.send_replace(ConsumerState::Stopped);
        tracing::info!(topic = %topic, group, consumer, "Consumer stopped");

        result
    }

    /// Handle one entry and acknowledge it on success
    async fn process(&self, entry: &LogEntry) {
        let envelope = match entry.envelope() {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    topic = %entry.topic,
                    entry_id = %entry.id,
                    error = %e,
                    "Invalid envelope, leaving entry pending"
                );
                return;
            }
        };

        if let Err(e) = self.handler.handle(&envelope).await {
            tracing::error!(
                topic = %entry.topic,
                entry_id = %entry.id,
                event_type = %envelope.event_type,
                error = %e,
                "Handler failed, entry will be redelivered"
            );
            return;
        }

        if let Err(e) = self
            .log
            .ack(entry.topic, &self.config.group, &entry.id)
            .await
        {
            tracing::warn!(
                topic = %entry.topic,
                entry_id = %entry.id,
                error = %e,
                "Failed to acknowledge entry"
            );
            return;
        }

        tracing::debug!(
            topic = %entry.topic,
            entry_id = %entry.id,
            event_type = %envelope.event_type,
            "Entry processed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_config_defaults() {
        let config = ConsumerConfig::new(Topic::TransactionEvents, "g", "c");
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.block, Duration::from_secs(5));
        assert_eq!(config.claim_idle, Duration::from_secs(30));
        assert_eq!(config.retry_backoff, Duration::from_secs(1));

        let options = config.with_batch_size(3).read_options();
        assert_eq!(options.count, 3);
    }

    #[test]
    fn test_consumer_state_names() {
        assert_eq!(ConsumerState::Running.as_str(), "running");
        assert_eq!(ConsumerState::Stopped.as_str(), "stopped");
    }
}
