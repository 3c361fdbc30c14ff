//! Event Log module
//!
//! Append-only per-topic log with consumer groups and at-least-once
//! delivery. Command services append through the [`Publisher`]; projectors
//! are driven by a [`Consumer`] loop.

mod consumer;
mod error;
mod log;
mod memory;
mod publisher;
mod redis_log;

pub use consumer::{Consumer, ConsumerConfig, ConsumerError, ConsumerState, EventHandler};
pub use error::{EventLogError, EventLogResult};
pub use log::{EventLog, LogEntry, ReadOptions};
pub use memory::InMemoryEventLog;
pub use publisher::Publisher;
pub use redis_log::RedisEventLog;
