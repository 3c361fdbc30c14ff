//! Common test utilities
//!
//! In-memory wiring of the whole pipeline plus a few handler doubles.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use ledger_pipeline::cache::InMemoryCache;
use ledger_pipeline::domain::{
    Account, Amount, EventEnvelope, Topic, TransactionCreated, TransactionType, UserDeleted,
};
use ledger_pipeline::event_log::{
    Consumer, ConsumerConfig, ConsumerError, EventHandler, InMemoryEventLog, Publisher,
};
use ledger_pipeline::idempotency::{ProcessedTransactions, DEFAULT_MARKER_TTL};
use ledger_pipeline::projection::{AccountActivityProjector, BalanceProjector};
use ledger_pipeline::read_model::{
    AccountReadRepository, CachedAccountCounter, StoreActiveAccounts, TransactionReadRepository,
    UserReadRepository,
};
use ledger_pipeline::services::{
    AccountCommandService, AccountQueryService, TransactionCommandService,
    TransactionQueryService, UserCommandService, UserQueryService,
};
use ledger_pipeline::store::{
    AccountStore, InMemoryAccountStore, InMemoryTransactionStore, InMemoryUserStore,
};

pub const BALANCE_GROUP: &str = "account-service-group";
pub const ACTIVITY_GROUP: &str = "user-service-group";

/// Consumer settings tuned for tests: short blocks, quick backoff
pub fn fast_consumer(topic: Topic, group: &str, name: &str) -> ConsumerConfig {
    ConsumerConfig::new(topic, group, name)
        .with_block(Duration::from_millis(20))
        .with_retry_backoff(Duration::from_millis(20))
}

/// Poll `check` until it holds or two seconds pass
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// A consumer running on its own task
pub struct Running {
    stop: watch::Sender<bool>,
    handle: JoinHandle<Result<(), ConsumerError>>,
}

impl Running {
    pub fn spawn<H>(consumer: Consumer<H>) -> Self
    where
        H: EventHandler + 'static,
    {
        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(consumer.run(stop_rx));
        Self { stop, handle }
    }

    /// Signal shutdown and wait for the loop to exit
    pub async fn stop(self) -> Result<(), ConsumerError> {
        let _ = self.stop.send(true);
        self.handle.await.expect("consumer task panicked")
    }
}

// =========================================================================
// Pipeline fixture
// =========================================================================

pub struct Pipeline {
    pub accounts: Arc<InMemoryAccountStore>,
    pub transactions: Arc<InMemoryTransactionStore>,
    pub users: Arc<InMemoryUserStore>,
    pub cache: Arc<InMemoryCache>,
    pub log: Arc<InMemoryEventLog>,
    pub publisher: Publisher,
    pub account_views: AccountReadRepository,
    pub projector: BalanceProjector,
    pub account_commands: AccountCommandService,
    pub account_queries: AccountQueryService,
    pub transaction_commands: TransactionCommandService,
    pub transaction_queries: TransactionQueryService,
    pub user_commands: UserCommandService,
    pub user_queries: UserQueryService,
}

impl Pipeline {
    pub fn new() -> Self {
        let accounts = Arc::new(InMemoryAccountStore::new());
        let transactions = Arc::new(InMemoryTransactionStore::new());
        let users = Arc::new(InMemoryUserStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let log = Arc::new(InMemoryEventLog::new());
        let publisher = Publisher::new(log.clone());

        let account_views = AccountReadRepository::new(accounts.clone(), cache.clone());
        let transaction_views =
            TransactionReadRepository::new(transactions.clone(), cache.clone());
        let user_views = UserReadRepository::new(users.clone(), cache.clone());

        let projector = BalanceProjector::new(
            accounts.clone(),
            account_views.clone(),
            ProcessedTransactions::new(cache.clone(), DEFAULT_MARKER_TTL),
            publisher.clone(),
        );

        Self {
            account_commands: AccountCommandService::new(
                accounts.clone(),
                account_views.clone(),
                publisher.clone(),
            ),
            account_queries: AccountQueryService::new(account_views.clone()),
            transaction_commands: TransactionCommandService::new(
                transactions.clone(),
                transaction_views.clone(),
                account_views.clone(),
                publisher.clone(),
            ),
            transaction_queries: TransactionQueryService::new(
                transaction_views,
                account_views.clone(),
            ),
            user_commands: UserCommandService::new(
                users.clone(),
                user_views.clone(),
                Arc::new(StoreActiveAccounts::new(accounts.clone())),
                publisher.clone(),
            ),
            user_queries: UserQueryService::new(user_views),
            accounts,
            transactions,
            users,
            cache,
            log,
            publisher,
            account_views,
            projector,
        }
    }

    /// Insert an account straight into the store
    pub async fn seed_account(&self, account_number: &str, user_id: &str, balance: Decimal) {
        let now = Utc::now();
        self.accounts
            .create(&Account {
                account_number: account_number.to_string(),
                user_id: user_id.to_string(),
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
    }

    pub async fn balance(&self, account_number: &str) -> Decimal {
        self.accounts.get(account_number).await.unwrap().balance
    }

    /// Append a `transaction.created` event
    pub async fn publish_transaction(
        &self,
        transaction_id: &str,
        account_number: &str,
        amount: Decimal,
        transaction_type: TransactionType,
    ) {
        self.publisher
            .publish_event(&transaction_created(
                transaction_id,
                account_number,
                amount,
                transaction_type,
            ))
            .await
            .unwrap();
    }

    /// Balance projector consumer on `transaction.events`
    pub fn balance_consumer(&self, claim_idle: Duration) -> Consumer<BalanceProjector> {
        Consumer::new(
            self.log.clone(),
            Arc::new(self.projector.clone()),
            fast_consumer(Topic::TransactionEvents, BALANCE_GROUP, "account-consumer-1")
                .with_claim_idle(claim_idle),
        )
    }

    /// Account activity consumer on `account.events`
    pub fn activity_consumer(&self) -> (Consumer<AccountActivityProjector>, CachedAccountCounter) {
        let counter = CachedAccountCounter::new(self.cache.clone());
        let consumer = Consumer::new(
            self.log.clone(),
            Arc::new(AccountActivityProjector::new(counter.clone())),
            fast_consumer(Topic::AccountEvents, ACTIVITY_GROUP, "user-consumer-1"),
        );
        (consumer, counter)
    }
}

pub fn transaction_created(
    transaction_id: &str,
    account_number: &str,
    amount: Decimal,
    transaction_type: TransactionType,
) -> TransactionCreated {
    TransactionCreated {
        transaction_id: transaction_id.to_string(),
        account_number: account_number.to_string(),
        user_id: "usr-1".to_string(),
        amount: Amount::new(amount).unwrap(),
        transaction_type,
        currency: "GBP".to_string(),
    }
}

// =========================================================================
// Handler doubles
// =========================================================================

#[derive(Debug, thiserror::Error)]
#[error("injected handler failure")]
pub struct InjectedFailure;

/// Records the user id of every `user.deleted` payload it handles and
/// fails the first `failures` calls
#[derive(Default)]
pub struct RecordingHandler {
    seen: Mutex<Vec<String>>,
    failures: AtomicUsize,
    calls: AtomicUsize,
}

impl RecordingHandler {
    pub fn failing(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            ..Self::default()
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    type Error = InjectedFailure;

    async fn handle(&self, envelope: &EventEnvelope) -> Result<(), InjectedFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(InjectedFailure);
        }

        let payload: UserDeleted = envelope.payload_as().map_err(|_| InjectedFailure)?;
        self.seen.lock().push(payload.user_id);
        Ok(())
    }
}

/// Append a `user.deleted` event for `user_id`
pub async fn publish_marker_event(publisher: &Publisher, user_id: &str) {
    publisher
        .publish_event(&UserDeleted {
            user_id: user_id.to_string(),
        })
        .await
        .unwrap();
}
