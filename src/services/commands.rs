//! Command and query definitions
//!
//! Commands represent intentions to change the system state; queries carry
//! the caller's identity so services can enforce ownership.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Address, TransactionType, DEFAULT_CURRENCY};

// =========================================================================
// Users
// =========================================================================

/// Command to register a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserCommand {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: Address,
}

impl CreateUserCommand {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone_number: String::new(),
            address: Address::default(),
        }
    }

    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = phone_number.into();
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }
}

/// Command to replace a user's profile fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserCommand {
    pub user_id: String,
    pub requesting_user_id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: Address,
}

/// Command to delete a user with no open accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserCommand {
    pub user_id: String,
    pub requesting_user_id: String,
}

// =========================================================================
// Accounts
// =========================================================================

/// Command to open an account for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountCommand {
    pub user_id: String,
    pub name: String,
    pub account_type: String,
}

impl CreateAccountCommand {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        account_type: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            account_type: account_type.into(),
        }
    }
}

/// Command to rename or retype an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAccountCommand {
    pub account_number: String,
    pub requesting_user_id: String,
    pub name: String,
    pub account_type: String,
}

/// Command to close an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAccountCommand {
    pub account_number: String,
    pub requesting_user_id: String,
}

// =========================================================================
// Transactions
// =========================================================================

/// Command to record a deposit or withdrawal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionCommand {
    pub account_number: String,
    pub user_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub transaction_type: TransactionType,
    pub reference: Option<String>,
}

impl CreateTransactionCommand {
    pub fn new(
        account_number: impl Into<String>,
        user_id: impl Into<String>,
        amount: Decimal,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            account_number: account_number.into(),
            user_id: user_id.into(),
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
            transaction_type,
            reference: None,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

// =========================================================================
// Queries
// =========================================================================

#[derive(Debug, Clone)]
pub struct GetUserQuery {
    pub user_id: String,
    pub requesting_user_id: String,
}

#[derive(Debug, Clone)]
pub struct GetAccountQuery {
    pub account_number: String,
    pub requesting_user_id: String,
}

#[derive(Debug, Clone)]
pub struct ListAccountsQuery {
    pub user_id: String,
}

#[derive(Debug, Clone)]
pub struct GetTransactionQuery {
    pub transaction_id: String,
    pub account_number: String,
    pub user_id: String,
}

#[derive(Debug, Clone)]
pub struct ListTransactionsQuery {
    pub account_number: String,
    pub user_id: String,
}
