//! Balance Projector
//!
//! Applies `transaction.created` events to account balances. Duplicate
//! deliveries are filtered by the cache marker first and by the store's
//! processed-transaction set second, so a balance moves at most once per
//! transaction id.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::{BalanceUpdated, EventEnvelope, EventType, TransactionCreated};
use crate::event_log::{EventHandler, Publisher};
use crate::idempotency::ProcessedTransactions;
use crate::read_model::{AccountReadRepository, AccountView};
use crate::store::{AccountStore, BalanceApplication};

use super::ProjectionError;

/// What a projection did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionOutcome {
    /// Balance moved to `balance`
    Applied { balance: Decimal },
    /// Transaction had already been applied; nothing changed
    Duplicate,
}

/// Projects transactions onto account balances
#[derive(Clone)]
pub struct BalanceProjector {
    accounts: Arc<dyn AccountStore>,
    views: AccountReadRepository,
    markers: ProcessedTransactions,
    publisher: Publisher,
}

impl BalanceProjector {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        views: AccountReadRepository,
        markers: ProcessedTransactions,
        publisher: Publisher,
    ) -> Self {
        Self {
            accounts,
            views,
            markers,
            publisher,
        }
    }

    // =========================================================================
    // project
    // =========================================================================

    /// Apply one transaction to its account
    pub async fn project(
        &self,
        event: &TransactionCreated,
    ) -> Result<ProjectionOutcome, ProjectionError> {
        let transaction_id = event.transaction_id.as_str();
        let account_number = event.account_number.as_str();

        match self.markers.is_processed(transaction_id).await {
            Ok(true) => {
                tracing::info!(
                    transaction_id,
                    account_number,
                    "Transaction already processed, skipping duplicate"
                );
                return Ok(ProjectionOutcome::Duplicate);
            }
            Ok(false) => {}
            // The store's processed set still guards the balance
            Err(e) => {
                tracing::warn!(transaction_id, error = %e, "Marker lookup failed");
            }
        }

        let account = self
            .accounts
            .get(account_number)
            .await
            .map_err(|e| ProjectionError::from_account_lookup(e, account_number))?;

        let delta = event.balance_delta();
        let application = self
            .accounts
            .apply_transaction_delta(account_number, transaction_id, delta)
            .await
            .map_err(|e| ProjectionError::from_account_lookup(e, account_number))?;

        if let Err(e) = self.markers.mark_processed(transaction_id).await {
            tracing::warn!(
                transaction_id,
                error = %e,
                "Failed to write processed marker"
            );
        }

        // Rebuild from the record as committed now, so concurrent renames
        // are not reverted by the snapshot loaded above
        match self.accounts.get(account_number).await {
            Ok(current) => self.views.cache_view(&AccountView::from(&current)).await,
            Err(e) => {
                tracing::warn!(
                    account_number,
                    error = %e,
                    "Failed to reload account, dropping cached view"
                );
                self.views.invalidate(account_number).await;
            }
        }

        match application {
            BalanceApplication::Applied { balance } => {
                self.publisher
                    .notify(&BalanceUpdated {
                        account_number: account_number.to_string(),
                        new_balance: balance,
                        change: delta,
                    })
                    .await;

                tracing::info!(
                    transaction_id,
                    account_number,
                    previous_balance = %account.balance,
                    new_balance = %balance,
                    "Balance updated"
                );
                Ok(ProjectionOutcome::Applied { balance })
            }
            BalanceApplication::AlreadyApplied { .. } => {
                tracing::info!(
                    transaction_id,
                    account_number,
                    "Transaction already applied to balance, marker restored"
                );
                Ok(ProjectionOutcome::Duplicate)
            }
        }
    }
}

#[async_trait]
impl EventHandler for BalanceProjector {
    type Error = ProjectionError;

    async fn handle(&self, envelope: &EventEnvelope) -> Result<(), ProjectionError> {
        if envelope.event_type != EventType::TransactionCreated {
            tracing::debug!(event_type = %envelope.event_type, "Ignoring event");
            return Ok(());
        }

        let event: TransactionCreated = envelope.payload_as()?;
        self.project(&event).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, InMemoryCache};
    use crate::domain::{Account, Amount, Topic, TransactionType};
    use crate::event_log::InMemoryEventLog;
    use crate::idempotency::DEFAULT_MARKER_TTL;
    use crate::store::InMemoryAccountStore;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    struct Fixture {
        accounts: Arc<InMemoryAccountStore>,
        cache: Arc<InMemoryCache>,
        log: Arc<InMemoryEventLog>,
        projector: BalanceProjector,
    }

    async fn fixture(balance: Decimal) -> Fixture {
        let accounts = Arc::new(InMemoryAccountStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let log = Arc::new(InMemoryEventLog::new());

        let now = Utc::now();
        accounts
            .create(&Account {
                account_number: "01000001".to_string(),
                user_id: "usr-abc".to_string(),
                sort_code: "10-10-10".to_string(),
                name: "Main".to_string(),
                account_type: "personal".to_string(),
                balance,
                currency: "GBP".to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let projector = BalanceProjector::new(
            accounts.clone(),
            AccountReadRepository::new(accounts.clone(), cache.clone()),
            ProcessedTransactions::new(cache.clone(), DEFAULT_MARKER_TTL),
            Publisher::new(log.clone()),
        );

        Fixture {
            accounts,
            cache,
            log,
            projector,
        }
    }

    fn transaction(id: &str, amount: Decimal, transaction_type: TransactionType) -> TransactionCreated {
        TransactionCreated {
            transaction_id: id.to_string(),
            account_number: "01000001".to_string(),
            user_id: "usr-abc".to_string(),
            amount: Amount::new(amount).unwrap(),
            transaction_type,
            currency: "GBP".to_string(),
        }
    }

    #[tokio::test]
    async fn test_deposit_then_withdrawal() {
        let f = fixture(dec!(100)).await;

        let outcome = f
            .projector
            .project(&transaction("tan-1", dec!(50), TransactionType::Deposit))
            .await
            .unwrap();
        assert_eq!(outcome, ProjectionOutcome::Applied { balance: dec!(150) });

        f.projector
            .project(&transaction("tan-2", dec!(30.25), TransactionType::Withdrawal))
            .await
            .unwrap();
        assert_eq!(f.accounts.get("01000001").await.unwrap().balance, dec!(119.75));
    }

    #[tokio::test]
    async fn test_withdrawal_may_overdraw() {
        let f = fixture(dec!(10)).await;
        f.projector
            .project(&transaction("tan-1", dec!(25), TransactionType::Withdrawal))
            .await
            .unwrap();
        assert_eq!(f.accounts.get("01000001").await.unwrap().balance, dec!(-15));
    }

    #[tokio::test]
    async fn test_duplicate_is_noop() {
        let f = fixture(dec!(100)).await;
        let event = transaction("tan-1", dec!(50), TransactionType::Deposit);

        f.projector.project(&event).await.unwrap();
        let second = f.projector.project(&event).await.unwrap();

        assert_eq!(second, ProjectionOutcome::Duplicate);
        assert_eq!(f.accounts.get("01000001").await.unwrap().balance, dec!(150));
        assert_eq!(f.log.entries(Topic::AccountEvents).len(), 1);
    }

    #[tokio::test]
    async fn test_view_marker_and_balance_event() {
        let f = fixture(Decimal::ZERO).await;
        f.projector
            .project(&transaction("tan-1", dec!(1000), TransactionType::Deposit))
            .await
            .unwrap();

        assert!(f.cache.exists("processed:txn:tan-1").await.unwrap());
        let raw = f.cache.get("account:view:01000001").await.unwrap().unwrap();
        let view: AccountView = serde_json::from_str(&raw).unwrap();
        assert_eq!(view.balance, dec!(1000));

        let entries = f.log.entries(Topic::AccountEvents);
        let envelope = entries[0].envelope().unwrap();
        assert_eq!(envelope.event_type, EventType::BalanceUpdated);
        let event: BalanceUpdated = envelope.payload_as().unwrap();
        assert_eq!(event.new_balance, dec!(1000));
        assert_eq!(event.change, dec!(1000));
    }

    #[tokio::test]
    async fn test_missing_account_is_an_error() {
        let f = fixture(Decimal::ZERO).await;
        let mut event = transaction("tan-1", dec!(5), TransactionType::Deposit);
        event.account_number = "01999999".to_string();

        let err = f.projector.project(&event).await.unwrap_err();
        assert!(matches!(err, ProjectionError::AccountNotFound(_)));
        assert!(!f.cache.exists("processed:txn:tan-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_handle_ignores_other_event_types() {
        let f = fixture(Decimal::ZERO).await;
        let envelope = EventEnvelope::new(
            EventType::AccountDeleted,
            &serde_json::json!({"accountNumber": "01000001", "userId": "usr-abc"}),
        )
        .unwrap();

        f.projector.handle(&envelope).await.unwrap();
        assert!(f.log.entries(Topic::AccountEvents).is_empty());
    }

    #[tokio::test]
    async fn test_handle_rejects_bad_payload() {
        let f = fixture(Decimal::ZERO).await;
        let envelope = EventEnvelope::new(
            EventType::TransactionCreated,
            &serde_json::json!({"transactionId": "tan-1"}),
        )
        .unwrap();

        let err = f.projector.handle(&envelope).await.unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidPayload(_)));
    }
}
