//! Configuration module
//!
//! Loads configuration from environment variables. The resulting [`Config`]
//! is built once at process start and handed to every component that needs it.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::Topic;
use crate::event_log::ConsumerConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Redis connection URL (read models and event streams)
    pub redis_url: String,

    /// Health endpoint host
    pub host: String,

    /// Health endpoint port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Emit logs as JSON
    pub log_json: bool,

    /// Consumer instance name, unique within each consumer group
    pub consumer_name: String,

    /// Maximum entries fetched per read
    pub consumer_batch_size: usize,

    /// How long a read blocks waiting for new entries
    pub consumer_block: Duration,

    /// How long an unacknowledged entry stays with its consumer before
    /// another read may claim it
    pub consumer_claim_idle: Duration,

    /// Lifetime of processed-transaction markers
    pub idempotency_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 10)?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = parse_or("PORT", 8083)?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let log_json = env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let consumer_name =
            env::var("CONSUMER_NAME").unwrap_or_else(|_| "account-consumer-1".to_string());

        let consumer_batch_size: usize = parse_or("CONSUMER_BATCH_SIZE", 10)?;
        if consumer_batch_size == 0 {
            return Err(ConfigError::InvalidValue("CONSUMER_BATCH_SIZE"));
        }

        let consumer_block = Duration::from_millis(parse_or("CONSUMER_BLOCK_MS", 5_000)?);
        let consumer_claim_idle =
            Duration::from_millis(parse_or("CONSUMER_CLAIM_IDLE_MS", 30_000)?);

        let idempotency_ttl_hours: u64 = parse_or("IDEMPOTENCY_TTL_HOURS", 72)?;
        if idempotency_ttl_hours == 0 {
            return Err(ConfigError::InvalidValue("IDEMPOTENCY_TTL_HOURS"));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            redis_url,
            host,
            port,
            environment,
            log_json,
            consumer_name,
            consumer_batch_size,
            consumer_block,
            consumer_claim_idle,
            idempotency_ttl: Duration::from_secs(idempotency_ttl_hours * 3600),
        })
    }

    /// Consumer settings for one topic/group pair
    pub fn consumer(&self, topic: Topic, group: &str) -> ConsumerConfig {
        ConsumerConfig::new(topic, group, &self.consumer_name)
            .with_batch_size(self.consumer_batch_size)
            .with_block(self.consumer_block)
            .with_claim_idle(self.consumer_claim_idle)
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
