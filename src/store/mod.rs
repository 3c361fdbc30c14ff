//! Durable record store
//!
//! Source of truth for users, accounts and transactions. The pipeline only
//! depends on the traits defined here; PostgreSQL backs them in production
//! and the in-memory implementations back tests and local runs.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Account, Transaction, User};

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryAccountStore, InMemoryTransactionStore, InMemoryUserStore};
pub use postgres::{PgAccountStore, PgTransactionStore, PgUserStore};

/// Outcome of applying a transaction's balance delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceApplication {
    /// The delta was added; `balance` is the new balance
    Applied { balance: Decimal },
    /// The transaction had been applied before; `balance` is unchanged
    AlreadyApplied { balance: Decimal },
}

impl BalanceApplication {
    pub fn balance(&self) -> Decimal {
        match self {
            BalanceApplication::Applied { balance } => *balance,
            BalanceApplication::AlreadyApplied { balance } => *balance,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, BalanceApplication::Applied { .. })
    }
}

/// Account records
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account; `Duplicate` if the number is taken
    async fn create(&self, account: &Account) -> StoreResult<()>;

    /// Fetch a live (not soft-deleted) account
    async fn get(&self, account_number: &str) -> StoreResult<Account>;

    /// All live accounts of a user, newest first
    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<Account>>;

    /// Persist name, account type and `updated_at`
    async fn update(&self, account: &Account) -> StoreResult<()>;

    async fn soft_delete(&self, account_number: &str) -> StoreResult<()>;

    async fn count_active_by_user(&self, user_id: &str) -> StoreResult<i64>;

    /// Record `transaction_id` as processed and add `delta` to the balance in
    /// one atomic step. A transaction id already recorded leaves the balance
    /// untouched.
    async fn apply_transaction_delta(
        &self,
        account_number: &str,
        transaction_id: &str,
        delta: Decimal,
    ) -> StoreResult<BalanceApplication>;
}

/// Transaction records (append-only)
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, transaction: &Transaction) -> StoreResult<()>;

    async fn get(&self, transaction_id: &str, account_number: &str) -> StoreResult<Transaction>;

    /// All transactions of an account, newest first
    async fn list_by_account(&self, account_number: &str) -> StoreResult<Vec<Transaction>>;
}

/// User records
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: &User) -> StoreResult<()>;

    async fn get(&self, user_id: &str) -> StoreResult<User>;

    /// Persist profile fields and `updated_at`
    async fn update(&self, user: &User) -> StoreResult<()>;

    async fn soft_delete(&self, user_id: &str) -> StoreResult<()>;
}
