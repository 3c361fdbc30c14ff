//! Redis backend tests
//!
//! Need a server: `REDIS_URL=... cargo test -- --ignored`

use std::time::{Duration, Instant};

use ledger_pipeline::cache::{CacheStore, RedisCache};
use ledger_pipeline::domain::{generate_id, Topic};
use ledger_pipeline::event_log::{EventLog, ReadOptions, RedisEventLog};

fn redis_url() -> String {
    dotenvy::dotenv().ok();
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

async fn connect_log() -> RedisEventLog {
    RedisEventLog::connect(&redis_url())
        .await
        .expect("Failed to connect event log")
}

fn options(block: Duration, claim_idle: Duration) -> ReadOptions {
    ReadOptions {
        count: 100,
        block,
        claim_idle,
    }
}

/// Create a fresh group and ack whatever earlier runs left on the topic
async fn fresh_group(log: &RedisEventLog, topic: Topic) -> String {
    let group = generate_id("grp");
    log.ensure_group(topic, &group).await.expect("ensure_group");

    let drain = options(Duration::from_millis(10), Duration::from_secs(3600));
    loop {
        let entries = log
            .read_group(topic, &group, "drain", &drain)
            .await
            .expect("drain read");
        if entries.is_empty() {
            break;
        }
        for entry in entries {
            log.ack(topic, &group, &entry.id).await.expect("drain ack");
        }
    }
    group
}

#[tokio::test]
#[ignore = "requires REDIS_URL"]
async fn test_idle_blocking_read_returns_empty_batch() {
    let log = connect_log().await;
    let group = fresh_group(&log, Topic::UserEvents).await;

    let started = Instant::now();
    let entries = log
        .read_group(
            Topic::UserEvents,
            &group,
            "idle",
            &options(Duration::from_millis(1500), Duration::from_secs(3600)),
        )
        .await
        .expect("idle read should not time out");

    assert!(entries.is_empty());
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
#[ignore = "requires REDIS_URL"]
async fn test_ensure_group_twice_keeps_cursor() {
    let log = connect_log().await;
    let topic = Topic::AccountEvents;
    let group = fresh_group(&log, topic).await;

    let id = log.append(topic, "{}").await.expect("append");
    let read = options(Duration::from_millis(100), Duration::from_secs(3600));
    let entries = log
        .read_group(topic, &group, "c1", &read)
        .await
        .expect("read");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id);
    log.ack(topic, &group, &id).await.expect("ack");

    log.ensure_group(topic, &group)
        .await
        .expect("existing group is not an error");

    let entries = log
        .read_group(topic, &group, "c1", &read)
        .await
        .expect("read after ensure");
    assert!(entries.is_empty());
}

#[tokio::test]
#[ignore = "requires REDIS_URL"]
async fn test_unacked_entry_is_claimed_by_another_consumer() {
    let log = connect_log().await;
    let topic = Topic::TransactionEvents;
    let group = fresh_group(&log, topic).await;

    let id = log.append(topic, "{}").await.expect("append");
    let first = log
        .read_group(
            topic,
            &group,
            "c1",
            &options(Duration::from_millis(100), Duration::from_secs(3600)),
        )
        .await
        .expect("first read");
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, id);

    tokio::time::sleep(Duration::from_millis(300)).await;

    let claimed = log
        .read_group(
            topic,
            &group,
            "c2",
            &options(Duration::from_millis(100), Duration::from_millis(200)),
        )
        .await
        .expect("claiming read");
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].id, id);

    log.ack(topic, &group, &id).await.expect("ack");
}

#[tokio::test]
#[ignore = "requires REDIS_URL"]
async fn test_cache_set_with_and_without_ttl() {
    let cache = RedisCache::connect(&redis_url())
        .await
        .expect("Failed to connect cache");
    let durable = generate_id("test:durable");
    let expiring = generate_id("test:expiring");

    cache
        .set(&durable, "kept".to_string(), None)
        .await
        .expect("set without ttl");
    cache
        .set(&expiring, "gone".to_string(), Some(Duration::from_secs(1)))
        .await
        .expect("set with ttl");
    assert_eq!(cache.get(&expiring).await.unwrap(), Some("gone".to_string()));

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert!(!cache.exists(&expiring).await.unwrap());
    assert_eq!(cache.get(&durable).await.unwrap(), Some("kept".to_string()));

    cache.delete(&durable).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires REDIS_URL"]
async fn test_cache_set_if_absent_keeps_existing_value() {
    let cache = RedisCache::connect(&redis_url())
        .await
        .expect("Failed to connect cache");
    let key = generate_id("test:nx");

    let stored = cache
        .set_if_absent(&key, "first".to_string(), Some(Duration::from_secs(60)))
        .await
        .unwrap();
    assert!(stored);

    let stored = cache
        .set_if_absent(&key, "second".to_string(), Some(Duration::from_secs(60)))
        .await
        .unwrap();
    assert!(!stored);
    assert_eq!(cache.get(&key).await.unwrap(), Some("first".to_string()));

    cache.delete(&key).await.expect("cleanup");
}
