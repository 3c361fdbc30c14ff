//! Read-model views
//!
//! Cached projections of the write-side records. Account and transaction
//! views keep the owner id for authorization checks; the response shapes
//! handed to callers leave it out.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Account, Address, Transaction, TransactionType, User};

pub const ACCOUNT_VIEW_PREFIX: &str = "account:view:";
pub const TRANSACTION_VIEW_PREFIX: &str = "transaction:view:";
pub const USER_VIEW_PREFIX: &str = "user:view:";

/// `account:view:<accountNumber>`
pub fn account_view_key(account_number: &str) -> String {
    format!("{}{}", ACCOUNT_VIEW_PREFIX, account_number)
}

/// `transaction:view:<accountNumber>:<transactionId>`
pub fn transaction_view_key(account_number: &str, transaction_id: &str) -> String {
    format!("{}{}:{}", TRANSACTION_VIEW_PREFIX, account_number, transaction_id)
}

/// `user:view:<userId>`
pub fn user_view_key(user_id: &str) -> String {
    format!("{}{}", USER_VIEW_PREFIX, user_id)
}

// =========================================================================
// Accounts
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub account_number: String,
    pub user_id: String,
    pub sort_code: String,
    pub name: String,
    pub account_type: String,
    pub balance: Decimal,
    pub currency: String,
    #[serde(rename = "createdTimestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedTimestamp")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            account_number: account.account_number.clone(),
            user_id: account.user_id.clone(),
            sort_code: account.sort_code.clone(),
            name: account.name.clone(),
            account_type: account.account_type.clone(),
            balance: account.balance,
            currency: account.currency.clone(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

impl AccountView {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn to_response(&self) -> AccountResponse {
        AccountResponse {
            account_number: self.account_number.clone(),
            sort_code: self.sort_code.clone(),
            name: self.name.clone(),
            account_type: self.account_type.clone(),
            balance: self.balance,
            currency: self.currency.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public account shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub account_number: String,
    pub sort_code: String,
    pub name: String,
    pub account_type: String,
    pub balance: Decimal,
    pub currency: String,
    #[serde(rename = "createdTimestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedTimestamp")]
    pub updated_at: DateTime<Utc>,
}

// =========================================================================
// Transactions
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: String,
    pub account_number: String,
    pub user_id: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "createdTimestamp")]
    pub created_at: DateTime<Utc>,
}

impl From<&Transaction> for TransactionView {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id.clone(),
            account_number: transaction.account_number.clone(),
            user_id: transaction.user_id.clone(),
            amount: transaction.amount,
            currency: transaction.currency.clone(),
            transaction_type: transaction.transaction_type,
            reference: transaction.reference.clone(),
            created_at: transaction.created_at,
        }
    }
}

impl TransactionView {
    pub fn to_response(&self) -> TransactionResponse {
        TransactionResponse {
            id: self.id.clone(),
            account_number: self.account_number.clone(),
            amount: self.amount,
            currency: self.currency.clone(),
            transaction_type: self.transaction_type,
            reference: self.reference.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public transaction shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub account_number: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "createdTimestamp")]
    pub created_at: DateTime<Utc>,
}

// =========================================================================
// Users
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: Address,
    #[serde(rename = "createdTimestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedTimestamp")]
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            address: user.address.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
