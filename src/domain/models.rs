//! Write-side records
//!
//! Authoritative shapes owned by the durable record store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sort code assigned to every account
pub const DEFAULT_SORT_CODE: &str = "10-10-10";

/// The only supported currency
pub const DEFAULT_CURRENCY: &str = "GBP";

/// Postal address of a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line3: Option<String>,
    pub town: String,
    pub county: String,
    pub postcode: String,
}

/// User record
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: Address,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account record. `balance` is only ever changed by the balance projector.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub account_number: String,
    pub user_id: String,
    pub sort_code: String,
    pub name: String,
    pub account_type: String,
    pub balance: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// Transaction record
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub account_number: String,
    pub user_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub transaction_type: TransactionType,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_parse_and_display() {
        assert_eq!("deposit".parse::<TransactionType>(), Ok(TransactionType::Deposit));
        assert_eq!(
            "withdrawal".parse::<TransactionType>(),
            Ok(TransactionType::Withdrawal)
        );
        assert!("transfer".parse::<TransactionType>().is_err());
        assert_eq!(TransactionType::Withdrawal.to_string(), "withdrawal");
    }

    #[test]
    fn test_address_optional_lines_omitted() {
        let address = Address {
            line1: "1 High Street".to_string(),
            town: "London".to_string(),
            county: "Greater London".to_string(),
            postcode: "N1 1AA".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&address).unwrap();
        assert!(json.get("line2").is_none());
        assert_eq!(json["postcode"], "N1 1AA");
    }
}
