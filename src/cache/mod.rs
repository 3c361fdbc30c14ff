//! Cache module
//!
//! Key/value cache used for read models, idempotency markers and auxiliary
//! counters. Redis backs it in production; [`InMemoryCache`] backs tests.

mod error;
mod memory;
mod redis_cache;
mod store;
mod view;

pub use error::{CacheError, CacheResult};
pub use memory::InMemoryCache;
pub use redis_cache::RedisCache;
pub use store::CacheStore;
pub use view::ViewCache;
