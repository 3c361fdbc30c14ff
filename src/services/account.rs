//! Account services

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::{
    generate_account_number, ids::is_valid_account_number, Account, AccountCreated,
    AccountDeleted, AccountUpdated, DEFAULT_CURRENCY, DEFAULT_SORT_CODE,
};
use crate::error::{AppError, AppResult};
use crate::event_log::Publisher;
use crate::read_model::{AccountReadRepository, AccountView};
use crate::store::{AccountStore, StoreError};

use super::{
    AccountCommander, AccountQuerier, CreateAccountCommand, DeleteAccountCommand,
    GetAccountQuery, ListAccountsQuery, UpdateAccountCommand,
};

/// Attempts at finding an unused account number
const ACCOUNT_NUMBER_ATTEMPTS: usize = 5;

/// Writes accounts and keeps their views current
#[derive(Clone)]
pub struct AccountCommandService {
    store: Arc<dyn AccountStore>,
    views: AccountReadRepository,
    publisher: Publisher,
}

impl AccountCommandService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        views: AccountReadRepository,
        publisher: Publisher,
    ) -> Self {
        Self {
            store,
            views,
            publisher,
        }
    }

    /// Load an account the requester owns
    async fn owned_account(&self, account_number: &str, user_id: &str) -> AppResult<Account> {
        let account = self.store.get(account_number).await?;
        if account.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(account)
    }
}

#[async_trait]
impl AccountCommander for AccountCommandService {
    async fn create_account(&self, command: CreateAccountCommand) -> AppResult<Account> {
        let now = Utc::now();
        let mut account = Account {
            account_number: generate_account_number(),
            user_id: command.user_id,
            sort_code: DEFAULT_SORT_CODE.to_string(),
            name: command.name,
            account_type: command.account_type,
            balance: Decimal::ZERO,
            currency: DEFAULT_CURRENCY.to_string(),
            created_at: now,
            updated_at: now,
        };

        let mut attempts = 0;
        loop {
            match self.store.create(&account).await {
                Ok(()) => break,
                Err(StoreError::Duplicate { .. }) if attempts + 1 < ACCOUNT_NUMBER_ATTEMPTS => {
                    attempts += 1;
                    account.account_number = generate_account_number();
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.views.cache_view(&AccountView::from(&account)).await;
        self.publisher
            .notify(&AccountCreated {
                account_number: account.account_number.clone(),
                user_id: account.user_id.clone(),
                name: account.name.clone(),
                account_type: account.account_type.clone(),
            })
            .await;

        tracing::info!(
            account_number = %account.account_number,
            user_id = %account.user_id,
            "Account created"
        );

        Ok(account)
    }

    async fn update_account(&self, command: UpdateAccountCommand) -> AppResult<AccountView> {
        let mut account = self
            .owned_account(&command.account_number, &command.requesting_user_id)
            .await?;

        account.name = command.name;
        account.account_type = command.account_type;
        account.updated_at = Utc::now();
        self.store.update(&account).await?;

        // Re-read so the view carries the balance as stored now
        let updated = self.store.get(&command.account_number).await?;
        let view = AccountView::from(&updated);
        self.views.cache_view(&view).await;

        self.publisher
            .notify(&AccountUpdated {
                account_number: updated.account_number.clone(),
                user_id: updated.user_id.clone(),
                name: updated.name.clone(),
            })
            .await;

        Ok(view)
    }

    async fn delete_account(&self, command: DeleteAccountCommand) -> AppResult<()> {
        let account = self
            .owned_account(&command.account_number, &command.requesting_user_id)
            .await?;

        self.store.soft_delete(&account.account_number).await?;
        self.views.invalidate(&account.account_number).await;

        self.publisher
            .notify(&AccountDeleted {
                account_number: account.account_number.clone(),
                user_id: account.user_id.clone(),
            })
            .await;

        tracing::info!(
            account_number = %account.account_number,
            user_id = %account.user_id,
            "Account deleted"
        );

        Ok(())
    }
}

/// Serves account reads from the view cache
#[derive(Clone)]
pub struct AccountQueryService {
    views: AccountReadRepository,
}

impl AccountQueryService {
    pub fn new(views: AccountReadRepository) -> Self {
        Self { views }
    }
}

#[async_trait]
impl AccountQuerier for AccountQueryService {
    async fn get_account(&self, query: GetAccountQuery) -> AppResult<AccountView> {
        if !is_valid_account_number(&query.account_number) {
            return Err(AppError::InvalidRequest(format!(
                "malformed account number: {}",
                query.account_number
            )));
        }

        let view = self.views.get(&query.account_number).await?;
        if !view.is_owned_by(&query.requesting_user_id) {
            return Err(AppError::Forbidden);
        }
        Ok(view)
    }

    async fn list_accounts(&self, query: ListAccountsQuery) -> AppResult<Vec<AccountView>> {
        Ok(self.views.list_by_user(&query.user_id).await?)
    }
}
