//! Redis Streams event log
//!
//! One stream per topic, entries carry the envelope in the `event` field.
//! Consumer groups map onto Redis consumer groups; stale pending entries are
//! taken over with XAUTOCLAIM before XREADGROUP asks for new ones.

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::streams::{
    StreamAutoClaimOptions, StreamAutoClaimReply, StreamId, StreamReadOptions, StreamReadReply,
};
use redis::{AsyncCommands, Client};

use crate::domain::Topic;

use super::{EventLog, EventLogError, EventLogResult, LogEntry, ReadOptions};

/// Stream field holding the serialized envelope
const EVENT_FIELD: &str = "event";

/// Redis Streams log.
///
/// Blocking reads hold the `reader` connection for up to the block timeout,
/// so each consumer loop should get its own `RedisEventLog`. The reader has
/// no response timeout; the server-side BLOCK bounds each read instead.
#[derive(Clone)]
pub struct RedisEventLog {
    connection: ConnectionManager,
    reader: ConnectionManager,
}

impl RedisEventLog {
    /// Connect to Redis at `url`
    pub async fn connect(url: &str) -> EventLogResult<Self> {
        let client = Client::open(url).map_err(|e| EventLogError::Connection(e.to_string()))?;

        let connection = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| EventLogError::Connection(e.to_string()))?;
        // A client-side timeout shorter than BLOCK drops replies the server
        // still delivers, stranding entries in the pending list
        let reader_config = ConnectionManagerConfig::new().set_response_timeout(None);
        let reader = ConnectionManager::new_with_config(client, reader_config)
            .await
            .map_err(|e| EventLogError::Connection(e.to_string()))?;

        Ok(Self { connection, reader })
    }

    fn to_entry(topic: Topic, stream_id: &StreamId) -> LogEntry {
        LogEntry {
            topic,
            id: stream_id.id.clone(),
            // A missing field decodes as an invalid envelope and is never acked
            body: stream_id.get::<String>(EVENT_FIELD).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl EventLog for RedisEventLog {
    async fn append(&self, topic: Topic, body: &str) -> EventLogResult<String> {
        let mut conn = self.connection.clone();
        let id: String = conn
            .xadd(topic.as_str(), "*", &[(EVENT_FIELD, body)])
            .await?;
        Ok(id)
    }

    async fn ensure_group(&self, topic: Topic, group: &str) -> EventLogResult<()> {
        let mut conn = self.connection.clone();
        let created: Result<(), redis::RedisError> =
            conn.xgroup_create_mkstream(topic.as_str(), group, "0").await;

        match created.map_err(EventLogError::from) {
            Ok(()) => Ok(()),
            Err(e) if e.is_busy_group() => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn read_group(
        &self,
        topic: Topic,
        group: &str,
        consumer: &str,
        options: &ReadOptions,
    ) -> EventLogResult<Vec<LogEntry>> {
        let stream = topic.as_str();
        let mut conn = self.connection.clone();

        let claim_options = StreamAutoClaimOptions::default().count(options.count);
        let claimed: StreamAutoClaimReply = conn
            .xautoclaim_options(
                stream,
                group,
                consumer,
                options.claim_idle.as_millis() as u64,
                "0-0",
                claim_options,
            )
            .await?;

        if !claimed.claimed.is_empty() {
            return Ok(claimed
                .claimed
                .iter()
                .map(|id| Self::to_entry(topic, id))
                .collect());
        }

        let read_options = StreamReadOptions::default()
            .group(group, consumer)
            .count(options.count)
            .block(options.block.as_millis() as usize);

        let mut reader = self.reader.clone();
        let reply: Option<StreamReadReply> = reader
            .xread_options(&[stream], &[">"], &read_options)
            .await?;

        Ok(reply
            .map(|reply| {
                reply
                    .keys
                    .iter()
                    .flat_map(|key| key.ids.iter())
                    .map(|id| Self::to_entry(topic, id))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn ack(&self, topic: Topic, group: &str, entry_id: &str) -> EventLogResult<()> {
        let mut conn = self.connection.clone();
        let _: i64 = conn.xack(topic.as_str(), group, &[entry_id]).await?;
        Ok(())
    }
}
