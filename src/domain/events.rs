//! Domain Events
//!
//! Event definitions carried over the event log.
//! Events are immutable facts that have happened in the system; every event
//! travels inside an [`EventEnvelope`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

use super::{Amount, TransactionType};

/// Closed set of event kinds published in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "user.created")]
    UserCreated,
    #[serde(rename = "user.updated")]
    UserUpdated,
    #[serde(rename = "user.deleted")]
    UserDeleted,
    #[serde(rename = "account.created")]
    AccountCreated,
    #[serde(rename = "account.updated")]
    AccountUpdated,
    #[serde(rename = "account.deleted")]
    AccountDeleted,
    #[serde(rename = "transaction.created")]
    TransactionCreated,
    #[serde(rename = "balance.updated")]
    BalanceUpdated,
}

impl EventType {
    /// Get the event type as its wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::UserCreated => "user.created",
            EventType::UserUpdated => "user.updated",
            EventType::UserDeleted => "user.deleted",
            EventType::AccountCreated => "account.created",
            EventType::AccountUpdated => "account.updated",
            EventType::AccountDeleted => "account.deleted",
            EventType::TransactionCreated => "transaction.created",
            EventType::BalanceUpdated => "balance.updated",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical topics of the event log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    UserEvents,
    AccountEvents,
    TransactionEvents,
}

impl Topic {
    /// Stream name used by the log backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::UserEvents => "user.events",
            Topic::AccountEvents => "account.events",
            Topic::TransactionEvents => "transaction.events",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical wrapper around every published event.
///
/// Wire form: `{"type": "...", "timestamp": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "data")]
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Wrap a payload, stamping it with the current UTC time
    pub fn new<P: Serialize>(event_type: EventType, payload: &P) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_type,
            timestamp: Utc::now(),
            payload: serde_json::to_value(payload)?,
        })
    }

    /// Decode the payload into its typed shape
    pub fn payload_as<P: DeserializeOwned>(&self) -> Result<P, serde_json::Error> {
        P::deserialize(&self.payload)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// A typed event payload bound to its event type and topic
pub trait DomainEvent: Serialize {
    const EVENT_TYPE: EventType;
    const TOPIC: Topic;
}

// =========================================================================
// User events
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreated {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdated {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDeleted {
    pub user_id: String,
}

impl DomainEvent for UserCreated {
    const EVENT_TYPE: EventType = EventType::UserCreated;
    const TOPIC: Topic = Topic::UserEvents;
}

impl DomainEvent for UserUpdated {
    const EVENT_TYPE: EventType = EventType::UserUpdated;
    const TOPIC: Topic = Topic::UserEvents;
}

impl DomainEvent for UserDeleted {
    const EVENT_TYPE: EventType = EventType::UserDeleted;
    const TOPIC: Topic = Topic::UserEvents;
}

// =========================================================================
// Account events
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCreated {
    pub account_number: String,
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub account_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdated {
    pub account_number: String,
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDeleted {
    pub account_number: String,
    pub user_id: String,
}

/// Derived event emitted by the balance projector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceUpdated {
    pub account_number: String,
    pub new_balance: Decimal,
    /// Signed delta applied to the balance
    pub change: Decimal,
}

impl DomainEvent for AccountCreated {
    const EVENT_TYPE: EventType = EventType::AccountCreated;
    const TOPIC: Topic = Topic::AccountEvents;
}

impl DomainEvent for AccountUpdated {
    const EVENT_TYPE: EventType = EventType::AccountUpdated;
    const TOPIC: Topic = Topic::AccountEvents;
}

impl DomainEvent for AccountDeleted {
    const EVENT_TYPE: EventType = EventType::AccountDeleted;
    const TOPIC: Topic = Topic::AccountEvents;
}

impl DomainEvent for BalanceUpdated {
    const EVENT_TYPE: EventType = EventType::BalanceUpdated;
    const TOPIC: Topic = Topic::AccountEvents;
}

// =========================================================================
// Transaction events
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCreated {
    pub transaction_id: String,
    pub account_number: String,
    #[serde(default)]
    pub user_id: String,
    pub amount: Amount,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl TransactionCreated {
    /// Signed balance delta this transaction represents
    pub fn balance_delta(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Deposit => self.amount.value(),
            TransactionType::Withdrawal => -self.amount.value(),
        }
    }
}

impl DomainEvent for TransactionCreated {
    const EVENT_TYPE: EventType = EventType::TransactionCreated;
    const TOPIC: Topic = Topic::TransactionEvents;
}

fn default_currency() -> String {
    super::models::DEFAULT_CURRENCY.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_type_wire_names() {
        let json = serde_json::to_string(&EventType::TransactionCreated).unwrap();
        assert_eq!(json, r#""transaction.created""#);
        assert_eq!(EventType::BalanceUpdated.as_str(), "balance.updated");

        let parsed: EventType = serde_json::from_str(r#""account.deleted""#).unwrap();
        assert_eq!(parsed, EventType::AccountDeleted);

        let unknown: Result<EventType, _> = serde_json::from_str(r#""account.frozen""#);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_envelope_wire_shape() {
        let payload = AccountDeleted {
            account_number: "01000001".to_string(),
            user_id: "usr-1".to_string(),
        };
        let envelope = EventEnvelope::new(EventType::AccountDeleted, &payload).unwrap();
        let value: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "account.deleted");
        assert_eq!(value["data"]["accountNumber"], "01000001");
        assert_eq!(value["data"]["userId"], "usr-1");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_transaction_created_decodes_numeric_amount() {
        let raw = r#"{
            "type": "transaction.created",
            "timestamp": "2026-01-01T00:00:00Z",
            "data": {
                "transactionId": "t1",
                "accountNumber": "01000001",
                "userId": "usr-1",
                "amount": 1000,
                "type": "deposit",
                "currency": "GBP"
            }
        }"#;
        let envelope = EventEnvelope::from_json(raw).unwrap();
        let event: TransactionCreated = envelope.payload_as().unwrap();

        assert_eq!(event.transaction_id, "t1");
        assert_eq!(event.amount.value(), dec!(1000));
        assert_eq!(event.balance_delta(), dec!(1000));
    }

    #[test]
    fn test_withdrawal_delta_is_negative() {
        let event = TransactionCreated {
            transaction_id: "t2".to_string(),
            account_number: "01000001".to_string(),
            user_id: "usr-1".to_string(),
            amount: Amount::new(dec!(25.50)).unwrap(),
            transaction_type: TransactionType::Withdrawal,
            currency: "GBP".to_string(),
        };
        assert_eq!(event.balance_delta(), dec!(-25.50));
    }
}
