//! Account Activity Projector
//!
//! User-side handler for `account.events`: keeps the per-user open-account
//! counter in step with account creation and deletion.

use async_trait::async_trait;

use crate::domain::{AccountCreated, AccountDeleted, EventEnvelope, EventType};
use crate::event_log::EventHandler;
use crate::read_model::CachedAccountCounter;

use super::ProjectionError;

/// Maintains `user:accounts:<userId>` from account events
#[derive(Clone)]
pub struct AccountActivityProjector {
    counter: CachedAccountCounter,
}

impl AccountActivityProjector {
    pub fn new(counter: CachedAccountCounter) -> Self {
        Self { counter }
    }
}

#[async_trait]
impl EventHandler for AccountActivityProjector {
    type Error = ProjectionError;

    async fn handle(&self, envelope: &EventEnvelope) -> Result<(), ProjectionError> {
        match envelope.event_type {
            EventType::AccountCreated => {
                let event: AccountCreated = envelope.payload_as()?;
                let count = self.counter.account_opened(&event.user_id).await?;
                tracing::info!(
                    user_id = %event.user_id,
                    account_number = %event.account_number,
                    open_accounts = count,
                    "User opened account"
                );
            }
            EventType::AccountDeleted => {
                let event: AccountDeleted = envelope.payload_as()?;
                let count = self.counter.account_closed(&event.user_id).await?;
                tracing::info!(
                    user_id = %event.user_id,
                    account_number = %event.account_number,
                    open_accounts = count,
                    "User closed account"
                );
            }
            other => {
                tracing::debug!(event_type = %other, "Ignoring account event");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::domain::BalanceUpdated;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn envelope<P: serde::Serialize>(event_type: EventType, payload: &P) -> EventEnvelope {
        EventEnvelope::new(event_type, payload).unwrap()
    }

    #[tokio::test]
    async fn test_counter_follows_account_events() {
        let counter = CachedAccountCounter::new(Arc::new(InMemoryCache::new()));
        let projector = AccountActivityProjector::new(counter.clone());

        for number in ["01000001", "01000002"] {
            let created = AccountCreated {
                account_number: number.to_string(),
                user_id: "usr-abc".to_string(),
                name: "Main".to_string(),
                account_type: "personal".to_string(),
            };
            projector
                .handle(&envelope(EventType::AccountCreated, &created))
                .await
                .unwrap();
        }
        let deleted = AccountDeleted {
            account_number: "01000001".to_string(),
            user_id: "usr-abc".to_string(),
        };
        projector
            .handle(&envelope(EventType::AccountDeleted, &deleted))
            .await
            .unwrap();

        assert_eq!(counter.count("usr-abc").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_balance_events_are_ignored() {
        let counter = CachedAccountCounter::new(Arc::new(InMemoryCache::new()));
        let projector = AccountActivityProjector::new(counter.clone());
        let event = BalanceUpdated {
            account_number: "01000001".to_string(),
            new_balance: Decimal::ONE,
            change: Decimal::ONE,
        };

        projector
            .handle(&envelope(EventType::BalanceUpdated, &event))
            .await
            .unwrap();
        assert_eq!(counter.count("usr-abc").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cache_outage_fails_the_event() {
        let cache = Arc::new(InMemoryCache::new());
        let projector = AccountActivityProjector::new(CachedAccountCounter::new(cache.clone()));
        cache.set_unavailable(true);

        let deleted = AccountDeleted {
            account_number: "01000001".to_string(),
            user_id: "usr-abc".to_string(),
        };
        let err = projector
            .handle(&envelope(EventType::AccountDeleted, &deleted))
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectionError::Cache(_)));
    }
}
