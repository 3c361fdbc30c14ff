//! Domain module
//!
//! Core domain types shared by the command services, the projectors and the
//! event pipeline.

pub mod amount;
pub mod events;
pub mod ids;
pub mod models;

pub use amount::{Amount, AmountError};
pub use events::{
    AccountCreated, AccountDeleted, AccountUpdated, BalanceUpdated, DomainEvent, EventEnvelope,
    EventType, Topic, TransactionCreated, UserCreated, UserDeleted, UserUpdated,
};
pub use ids::{generate_account_number, generate_id, TRANSACTION_ID_PREFIX, USER_ID_PREFIX};
pub use models::{
    Account, Address, Transaction, TransactionType, User, DEFAULT_CURRENCY, DEFAULT_SORT_CODE,
};
