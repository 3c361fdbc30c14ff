//! Projection module
//!
//! Event handlers that turn one service's events into another service's
//! state. Each projector is driven by a consumer loop and must tolerate
//! the same event arriving more than once.

mod activity;
mod balance;
mod error;

pub use activity::AccountActivityProjector;
pub use balance::{BalanceProjector, ProjectionOutcome};
pub use error::ProjectionError;
