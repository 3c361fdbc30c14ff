//! Idempotency module
//!
//! Fast-path duplicate detection for projected transactions using TTL
//! markers in the cache. The durable processed-transaction set in the
//! account store remains the authority.

mod repository;

pub use repository::{ProcessedTransactions, DEFAULT_MARKER_TTL, MARKER_PREFIX};
