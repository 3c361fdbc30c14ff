//! Command and query services
//!
//! Command services commit to the durable store, refresh the read model for
//! their own entity and then publish a domain event. Query services read
//! through the cache-aside repositories. Callers depend on the capability
//! traits below rather than on the concrete services.

mod account;
mod commands;
mod transaction;
mod user;


use async_trait::async_trait;

use crate::domain::{Account, Transaction, User};
use crate::error::AppResult;
use crate::read_model::{AccountView, TransactionView, UserView};

pub use account::{AccountCommandService, AccountQueryService};
pub use commands::*;
pub use transaction::{TransactionCommandService, TransactionQueryService};
pub use user::{UserCommandService, UserQueryService};

#[async_trait]
pub trait AccountCommander: Send + Sync {
    async fn create_account(&self, command: CreateAccountCommand) -> AppResult<Account>;
    async fn update_account(&self, command: UpdateAccountCommand) -> AppResult<AccountView>;
    async fn delete_account(&self, command: DeleteAccountCommand) -> AppResult<()>;
}

#[async_trait]
pub trait AccountQuerier: Send + Sync {
    async fn get_account(&self, query: GetAccountQuery) -> AppResult<AccountView>;
    async fn list_accounts(&self, query: ListAccountsQuery) -> AppResult<Vec<AccountView>>;
}

#[async_trait]
pub trait TransactionCommander: Send + Sync {
    async fn create_transaction(&self, command: CreateTransactionCommand)
        -> AppResult<Transaction>;
}

#[async_trait]
pub trait TransactionQuerier: Send + Sync {
    async fn get_transaction(&self, query: GetTransactionQuery) -> AppResult<TransactionView>;
    async fn list_transactions(
        &self,
        query: ListTransactionsQuery,
    ) -> AppResult<Vec<TransactionView>>;
}

#[async_trait]
pub trait UserCommander: Send + Sync {
    async fn create_user(&self, command: CreateUserCommand) -> AppResult<User>;
    async fn update_user(&self, command: UpdateUserCommand) -> AppResult<UserView>;
    async fn delete_user(&self, command: DeleteUserCommand) -> AppResult<()>;
}

#[async_trait]
pub trait UserQuerier: Send + Sync {
    async fn get_user(&self, query: GetUserQuery) -> AppResult<UserView>;
}
