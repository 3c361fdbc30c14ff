//! PostgreSQL record stores
//!
//! Soft-deleted rows carry a non-null `deleted_at` and are excluded from
//! every read. Schema lives in `migrations/0001_init.sql`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::{Account, Address, Transaction, TransactionType, User};

use super::{
    AccountStore, BalanceApplication, StoreError, StoreResult, TransactionStore, UserStore,
};

type AccountRow = (
    String,
    String,
    String,
    String,
    String,
    Decimal,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn account_from_row(row: AccountRow) -> Account {
    let (
        account_number,
        user_id,
        sort_code,
        name,
        account_type,
        balance,
        currency,
        created_at,
        updated_at,
    ) = row;
    Account {
        account_number,
        user_id,
        sort_code,
        name,
        account_type,
        balance,
        currency,
        created_at,
        updated_at,
    }
}

// =========================================================================
// Accounts
// =========================================================================

/// Account store backed by the `accounts` table
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create(&self, account: &Account) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                account_number, user_id, sort_code, name, account_type,
                balance, currency, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&account.account_number)
        .bind(&account.user_id)
        .bind(&account.sort_code)
        .bind(&account.name)
        .bind(&account.account_type)
        .bind(account.balance)
        .bind(&account.currency)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, "account", &account.account_number))?;

        Ok(())
    }

    async fn get(&self, account_number: &str) -> StoreResult<Account> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT account_number, user_id, sort_code, name, account_type,
                   balance, currency, created_at, updated_at
            FROM accounts
            WHERE account_number = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(account_from_row)
            .ok_or_else(|| StoreError::not_found("account", account_number))
    }

    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<Account>> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            r#"
            SELECT account_number, user_id, sort_code, name, account_type,
                   balance, currency, created_at, updated_at
            FROM accounts
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(account_from_row).collect())
    }

    async fn update(&self, account: &Account) -> StoreResult<()> {
        let rows = sqlx::query(
            r#"
            UPDATE accounts
            SET name = $2, account_type = $3, updated_at = $4
            WHERE account_number = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(&account.account_number)
        .bind(&account.name)
        .bind(&account.account_type)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(StoreError::not_found("account", &account.account_number));
        }
        Ok(())
    }

    async fn soft_delete(&self, account_number: &str) -> StoreResult<()> {
        let rows = sqlx::query(
            r#"
            UPDATE accounts SET deleted_at = NOW()
            WHERE account_number = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(account_number)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(StoreError::not_found("account", account_number));
        }
        Ok(())
    }

    async fn count_active_by_user(&self, user_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM accounts WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn apply_transaction_delta(
        &self,
        account_number: &str,
        transaction_id: &str,
        delta: Decimal,
    ) -> StoreResult<BalanceApplication> {
        let mut tx = self.pool.begin().await?;

        let recorded = sqlx::query(
            r#"
            INSERT INTO processed_transactions (transaction_id, account_number)
            VALUES ($1, $2)
            ON CONFLICT (transaction_id) DO NOTHING
            "#,
        )
        .bind(transaction_id)
        .bind(account_number)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if recorded == 0 {
            // Already applied; report the current balance without touching it
            tx.rollback().await?;
            let account = self.get(account_number).await?;
            return Ok(BalanceApplication::AlreadyApplied {
                balance: account.balance,
            });
        }

        let balance: Option<Decimal> = sqlx::query_scalar(
            r#"
            UPDATE accounts
            SET balance = balance + $2, updated_at = NOW()
            WHERE account_number = $1 AND deleted_at IS NULL
            RETURNING balance
            "#,
        )
        .bind(account_number)
        .bind(delta)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| StoreError::from_balance_update(e, account_number))?;

        let Some(balance) = balance else {
            tx.rollback().await?;
            return Err(StoreError::not_found("account", account_number));
        };

        tx.commit().await?;

        Ok(BalanceApplication::Applied { balance })
    }
}

// =========================================================================
// Transactions
// =========================================================================

type TransactionRow = (
    String,
    String,
    String,
    Decimal,
    String,
    String,
    Option<String>,
    DateTime<Utc>,
);

fn transaction_from_row(row: TransactionRow) -> StoreResult<Transaction> {
    let (id, account_number, user_id, amount, currency, kind, reference, created_at) = row;
    let transaction_type: TransactionType = kind.parse().map_err(|e: String| {
        StoreError::Database(sqlx::Error::Decode(e.into()))
    })?;
    Ok(Transaction {
        id,
        account_number,
        user_id,
        amount,
        currency,
        transaction_type,
        reference,
        created_at,
    })
}

/// Transaction store backed by the `transactions` table
#[derive(Debug, Clone)]
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn create(&self, transaction: &Transaction) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, account_number, user_id, amount, currency, type, reference, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.account_number)
        .bind(&transaction.user_id)
        .bind(transaction.amount)
        .bind(&transaction.currency)
        .bind(transaction.transaction_type.as_str())
        .bind(&transaction.reference)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, "transaction", &transaction.id))?;

        Ok(())
    }

    async fn get(&self, transaction_id: &str, account_number: &str) -> StoreResult<Transaction> {
        let row: Option<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, account_number, user_id, amount, currency, type, reference, created_at
            FROM transactions
            WHERE id = $1 AND account_number = $2
            "#,
        )
        .bind(transaction_id)
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => transaction_from_row(row),
            None => Err(StoreError::not_found("transaction", transaction_id)),
        }
    }

    async fn list_by_account(&self, account_number: &str) -> StoreResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, account_number, user_id, amount, currency, type, reference, created_at
            FROM transactions
            WHERE account_number = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(account_number)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(transaction_from_row).collect()
    }
}

// =========================================================================
// Users
// =========================================================================

type UserRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn user_from_row(row: UserRow) -> User {
    let (
        id,
        name,
        email,
        phone_number,
        line1,
        line2,
        line3,
        town,
        county,
        postcode,
        created_at,
        updated_at,
    ) = row;
    User {
        id,
        name,
        email,
        phone_number,
        address: Address {
            line1,
            line2,
            line3,
            town,
            county,
            postcode,
        },
        created_at,
        updated_at,
    }
}

/// User store backed by the `users` table
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, phone_number,
                address_line1, address_line2, address_line3,
                address_town, address_county, address_postcode,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.address.line1)
        .bind(&user.address.line2)
        .bind(&user.address.line3)
        .bind(&user.address.town)
        .bind(&user.address.county)
        .bind(&user.address.postcode)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, "user", &user.id))?;

        Ok(())
    }

    async fn get(&self, user_id: &str) -> StoreResult<User> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, phone_number,
                   address_line1, address_line2, address_line3,
                   address_town, address_county, address_postcode,
                   created_at, updated_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row)
            .ok_or_else(|| StoreError::not_found("user", user_id))
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let rows = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, phone_number = $4,
                address_line1 = $5, address_line2 = $6, address_line3 = $7,
                address_town = $8, address_county = $9, address_postcode = $10,
                updated_at = $11
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.address.line1)
        .bind(&user.address.line2)
        .bind(&user.address.line3)
        .bind(&user.address.town)
        .bind(&user.address.county)
        .bind(&user.address.postcode)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, "user", &user.email))?
        .rows_affected();

        if rows == 0 {
            return Err(StoreError::not_found("user", &user.id));
        }
        Ok(())
    }

    async fn soft_delete(&self, user_id: &str) -> StoreResult<()> {
        let rows = sqlx::query(
            "UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(StoreError::not_found("user", user_id));
        }
        Ok(())
    }
}
