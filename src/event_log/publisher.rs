//! Event publisher
//!
//! Wraps payloads in the canonical envelope and appends them to their topic.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::{DomainEvent, EventEnvelope, EventType, Topic};

use super::{EventLog, EventLogResult};

/// Appends enveloped events to the log
#[derive(Clone)]
pub struct Publisher {
    log: Arc<dyn EventLog>,
}

impl Publisher {
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self { log }
    }

    /// Envelope `payload` as `event_type`, stamped now, and append it to
    /// `topic`. Returns the entry id.
    pub async fn publish<P>(
        &self,
        topic: Topic,
        event_type: EventType,
        payload: &P,
    ) -> EventLogResult<String>
    where
        P: Serialize + Sync,
    {
        let envelope = EventEnvelope::new(event_type, payload)?;
        let body = envelope.to_json()?;
        let id = self.log.append(topic, &body).await?;

        tracing::debug!(
            topic = %topic,
            event_type = %event_type,
            entry_id = %id,
            "Event published"
        );

        Ok(id)
    }

    /// Publish a typed domain event to its own topic
    pub async fn publish_event<E>(&self, event: &E) -> EventLogResult<String>
    where
        E: DomainEvent + Sync,
    {
        self.publish(E::TOPIC, E::EVENT_TYPE, event).await
    }

    /// Publish after a committed mutation. Nothing is retried: a failure is
    /// logged and the caller carries on.
    pub async fn notify<E>(&self, event: &E)
    where
        E: DomainEvent + Sync,
    {
        if let Err(e) = self.publish_event(event).await {
            tracing::error!(
                topic = %E::TOPIC,
                event_type = %E::EVENT_TYPE,
                error = %e,
                "Failed to publish event"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountCreated, EventEnvelope};
    use crate::event_log::InMemoryEventLog;

    fn account_created() -> AccountCreated {
        AccountCreated {
            account_number: "01000001".to_string(),
            user_id: "usr-abc".to_string(),
            name: "Main".to_string(),
            account_type: "personal".to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_event_writes_envelope_to_topic() {
        let log = Arc::new(InMemoryEventLog::new());
        let publisher = Publisher::new(log.clone());

        publisher.publish_event(&account_created()).await.unwrap();

        let entries = log.entries(Topic::AccountEvents);
        assert_eq!(entries.len(), 1);
        let envelope: EventEnvelope = entries[0].envelope().unwrap();
        assert_eq!(envelope.event_type, EventType::AccountCreated);
        assert_eq!(
            envelope.payload_as::<AccountCreated>().unwrap(),
            account_created()
        );
    }

    #[tokio::test]
    async fn test_notify_swallows_log_failure() {
        let log = Arc::new(InMemoryEventLog::new());
        let publisher = Publisher::new(log.clone());
        log.set_unavailable(true);

        publisher.notify(&account_created()).await;

        log.set_unavailable(false);
        assert!(log.entries(Topic::AccountEvents).is_empty());
    }
}
