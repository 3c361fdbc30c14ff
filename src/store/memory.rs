//! In-memory record stores
//!
//! Same contract as the PostgreSQL stores, including soft-delete filtering
//! and the atomic processed-transaction bookkeeping.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{Account, Transaction, User};

use super::{
    AccountStore, BalanceApplication, StoreError, StoreResult, TransactionStore, UserStore,
};

#[derive(Debug, Clone)]
struct Row<T> {
    record: T,
    deleted: bool,
}

impl<T> Row<T> {
    fn live(record: T) -> Self {
        Self {
            record,
            deleted: false,
        }
    }
}

// =========================================================================
// Accounts
// =========================================================================

#[derive(Debug, Default)]
struct AccountTables {
    accounts: HashMap<String, Row<Account>>,
    processed: HashSet<String>,
}

/// In-memory account store
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    tables: Mutex<AccountTables>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a transaction id has been recorded as applied
    pub fn is_processed(&self, transaction_id: &str) -> bool {
        self.tables.lock().processed.contains(transaction_id)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create(&self, account: &Account) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if tables.accounts.contains_key(&account.account_number) {
            return Err(StoreError::duplicate("account", &account.account_number));
        }
        tables
            .accounts
            .insert(account.account_number.clone(), Row::live(account.clone()));
        Ok(())
    }

    async fn get(&self, account_number: &str) -> StoreResult<Account> {
        let tables = self.tables.lock();
        match tables.accounts.get(account_number) {
            Some(row) if !row.deleted => Ok(row.record.clone()),
            _ => Err(StoreError::not_found("account", account_number)),
        }
    }

    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<Account>> {
        let tables = self.tables.lock();
        let mut accounts: Vec<Account> = tables
            .accounts
            .values()
            .filter(|row| !row.deleted && row.record.user_id == user_id)
            .map(|row| row.record.clone())
            .collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(accounts)
    }

    async fn update(&self, account: &Account) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        match tables.accounts.get_mut(&account.account_number) {
            Some(row) if !row.deleted => {
                row.record.name = account.name.clone();
                row.record.account_type = account.account_type.clone();
                row.record.updated_at = account.updated_at;
                Ok(())
            }
            _ => Err(StoreError::not_found("account", &account.account_number)),
        }
    }

    async fn soft_delete(&self, account_number: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        match tables.accounts.get_mut(account_number) {
            Some(row) if !row.deleted => {
                row.deleted = true;
                Ok(())
            }
            _ => Err(StoreError::not_found("account", account_number)),
        }
    }

    async fn count_active_by_user(&self, user_id: &str) -> StoreResult<i64> {
        let tables = self.tables.lock();
        let count = tables
            .accounts
            .values()
            .filter(|row| !row.deleted && row.record.user_id == user_id)
            .count();
        Ok(count as i64)
    }

    async fn apply_transaction_delta(
        &self,
        account_number: &str,
        transaction_id: &str,
        delta: Decimal,
    ) -> StoreResult<BalanceApplication> {
        let mut tables = self.tables.lock();
        let AccountTables {
            accounts,
            processed,
        } = &mut *tables;

        let row = match accounts.get_mut(account_number) {
            Some(row) if !row.deleted => row,
            _ => return Err(StoreError::not_found("account", account_number)),
        };

        if processed.contains(transaction_id) {
            return Ok(BalanceApplication::AlreadyApplied {
                balance: row.record.balance,
            });
        }

        row.record.balance = row.record.balance.checked_add(delta).ok_or_else(|| {
            StoreError::BalanceOverflow {
                account_number: account_number.to_string(),
            }
        })?;
        row.record.updated_at = Utc::now();
        processed.insert(transaction_id.to_string());

        Ok(BalanceApplication::Applied {
            balance: row.record.balance,
        })
    }
}

// =========================================================================
// Transactions
// =========================================================================

/// In-memory transaction store
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    transactions: Mutex<HashMap<String, Transaction>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, transaction: &Transaction) -> StoreResult<()> {
        let mut transactions = self.transactions.lock();
        if transactions.contains_key(&transaction.id) {
            return Err(StoreError::duplicate("transaction", &transaction.id));
        }
        transactions.insert(transaction.id.clone(), transaction.clone());
        Ok(())
    }

    async fn get(&self, transaction_id: &str, account_number: &str) -> StoreResult<Transaction> {
        self.transactions
            .lock()
            .get(transaction_id)
            .filter(|t| t.account_number == account_number)
            .cloned()
            .ok_or_else(|| StoreError::not_found("transaction", transaction_id))
    }

    async fn list_by_account(&self, account_number: &str) -> StoreResult<Vec<Transaction>> {
        let mut list: Vec<Transaction> = self
            .transactions
            .lock()
            .values()
            .filter(|t| t.account_number == account_number)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }
}

// =========================================================================
// Users
// =========================================================================

/// In-memory user store
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, Row<User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.lock();
        if users.contains_key(&user.id) {
            return Err(StoreError::duplicate("user", &user.id));
        }
        if users
            .values()
            .any(|row| !row.deleted && row.record.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::duplicate("user", &user.email));
        }
        users.insert(user.id.clone(), Row::live(user.clone()));
        Ok(())
    }

    async fn get(&self, user_id: &str) -> StoreResult<User> {
        match self.users.lock().get(user_id) {
            Some(row) if !row.deleted => Ok(row.record.clone()),
            _ => Err(StoreError::not_found("user", user_id)),
        }
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.lock();
        match users.get_mut(&user.id) {
            Some(row) if !row.deleted => {
                row.record = User {
                    created_at: row.record.created_at,
                    ..user.clone()
                };
                Ok(())
            }
            _ => Err(StoreError::not_found("user", &user.id)),
        }
    }

    async fn soft_delete(&self, user_id: &str) -> StoreResult<()> {
        match self.users.lock().get_mut(user_id) {
            Some(row) if !row.deleted => {
                row.deleted = true;
                Ok(())
            }
            _ => Err(StoreError::not_found("user", user_id)),
        }
    }
}
