//! Transaction services
//!
//! Transactions are checked against the cached account view, recorded, and
//! announced on `transaction.events`. The balance itself moves later, when
//! the balance projector consumes the event.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::domain::{
    generate_id,
    ids::{is_valid_account_number, is_valid_transaction_id},
    Amount, Transaction, TransactionCreated, TransactionType, DEFAULT_CURRENCY,
    TRANSACTION_ID_PREFIX,
};
use crate::error::{AppError, AppResult};
use crate::event_log::Publisher;
use crate::read_model::{
    AccountReadRepository, AccountView, TransactionReadRepository, TransactionView,
};
use crate::store::TransactionStore;

use super::{
    CreateTransactionCommand, GetTransactionQuery, ListTransactionsQuery, TransactionCommander,
    TransactionQuerier,
};

/// Load the account view and check the caller owns it
async fn owned_account_view(
    accounts: &AccountReadRepository,
    account_number: &str,
    user_id: &str,
) -> AppResult<AccountView> {
    if !is_valid_account_number(account_number) {
        return Err(AppError::InvalidRequest(format!(
            "malformed account number: {}",
            account_number
        )));
    }

    let view = accounts.get(account_number).await?;
    if !view.is_owned_by(user_id) {
        return Err(AppError::Forbidden);
    }
    Ok(view)
}

/// Records transactions
#[derive(Clone)]
pub struct TransactionCommandService {
    store: Arc<dyn TransactionStore>,
    views: TransactionReadRepository,
    accounts: AccountReadRepository,
    publisher: Publisher,
}

impl TransactionCommandService {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        views: TransactionReadRepository,
        accounts: AccountReadRepository,
        publisher: Publisher,
    ) -> Self {
        Self {
            store,
            views,
            accounts,
            publisher,
        }
    }
}

#[async_trait]
impl TransactionCommander for TransactionCommandService {
    async fn create_transaction(
        &self,
        command: CreateTransactionCommand,
    ) -> AppResult<Transaction> {
        let amount = Amount::new(command.amount)
            .map_err(|e| AppError::InvalidRequest(e.to_string()))?;

        if command.currency != DEFAULT_CURRENCY {
            return Err(AppError::InvalidRequest(format!(
                "unsupported currency: {}",
                command.currency
            )));
        }

        let account =
            owned_account_view(&self.accounts, &command.account_number, &command.user_id).await?;

        // Checked against the projected balance, which may lag recent deposits
        if command.transaction_type == TransactionType::Withdrawal
            && account.balance < amount.value()
        {
            return Err(AppError::InsufficientFunds);
        }

        let transaction = Transaction {
            id: generate_id(TRANSACTION_ID_PREFIX),
            account_number: command.account_number,
            user_id: command.user_id,
            amount: amount.value(),
            currency: command.currency,
            transaction_type: command.transaction_type,
            reference: command.reference,
            created_at: Utc::now(),
        };
        self.store.create(&transaction).await?;
        self.views.cache_view(&TransactionView::from(&transaction)).await;

        self.publisher
            .notify(&TransactionCreated {
                transaction_id: transaction.id.clone(),
                account_number: transaction.account_number.clone(),
                user_id: transaction.user_id.clone(),
                amount,
                transaction_type: transaction.transaction_type,
                currency: transaction.currency.clone(),
            })
            .await;

        tracing::info!(
            transaction_id = %transaction.id,
            account_number = %transaction.account_number,
            transaction_type = %transaction.transaction_type,
            amount = %amount,
            "Transaction created"
        );

        Ok(transaction)
    }
}

/// Serves transaction reads; ownership is checked via the account view
#[derive(Clone)]
pub struct TransactionQueryService {
    views: TransactionReadRepository,
    accounts: AccountReadRepository,
}

impl TransactionQueryService {
    pub fn new(views: TransactionReadRepository, accounts: AccountReadRepository) -> Self {
        Self { views, accounts }
    }
}

#[async_trait]
impl TransactionQuerier for TransactionQueryService {
    async fn get_transaction(&self, query: GetTransactionQuery) -> AppResult<TransactionView> {
        if !is_valid_transaction_id(&query.transaction_id) {
            return Err(AppError::InvalidRequest(format!(
                "malformed transaction id: {}",
                query.transaction_id
            )));
        }
        owned_account_view(&self.accounts, &query.account_number, &query.user_id).await?;
        Ok(self
            .views
            .get(&query.transaction_id, &query.account_number)
            .await?)
    }

    async fn list_transactions(
        &self,
        query: ListTransactionsQuery,
    ) -> AppResult<Vec<TransactionView>> {
        owned_account_view(&self.accounts, &query.account_number, &query.user_id).await?;
        Ok(self.views.list_by_account(&query.account_number).await?)
    }
}
