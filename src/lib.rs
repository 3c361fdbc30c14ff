//! ledger_pipeline Library
//!
//! Event-driven ledger core: an event log with consumer groups, idempotent
//! projectors, a cache-aside read model and the command/query services that
//! feed them.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod domain;
pub mod event_log;
pub mod idempotency;
pub mod projection;
pub mod read_model;
pub mod services;
pub mod store;

mod error;

pub use config::Config;
pub use domain::{Amount, AmountError, EventEnvelope, EventType, Topic};
pub use error::{AppError, AppResult};
