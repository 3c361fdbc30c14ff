//! API module
//!
//! Operational HTTP surface: a health endpoint reporting consumer state.

pub mod routes;

pub use routes::{create_router, HealthState};
