//! In-memory event log
//!
//! Mirrors the Redis Streams consumer-group semantics closely enough to run
//! the pipeline in tests: per-group cursors, pending entries, idle claiming
//! and blocking reads.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::watch;

use crate::domain::Topic;

use super::{EventLog, EventLogError, EventLogResult, LogEntry, ReadOptions};

#[derive(Debug, Clone)]
struct PendingEntry {
    consumer: String,
    delivered_at: Instant,
    deliveries: u32,
}

#[derive(Debug, Default)]
struct GroupState {
    /// Number of entries already handed out as new
    cursor: usize,
    /// Keyed by entry sequence so claims come out in append order
    pending: BTreeMap<u64, PendingEntry>,
}

#[derive(Debug, Default)]
struct TopicLog {
    entries: Vec<(u64, String)>,
    groups: HashMap<String, GroupState>,
}

/// Process-local event log
#[derive(Debug)]
pub struct InMemoryEventLog {
    topics: Mutex<HashMap<Topic, TopicLog>>,
    appended: watch::Sender<u64>,
    unavailable: AtomicBool,
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        let (appended, _) = watch::channel(0);
        Self {
            topics: Mutex::new(HashMap::new()),
            appended,
            unavailable: AtomicBool::new(false),
        }
    }
}

fn entry_id(seq: u64) -> String {
    format!("{}-0", seq)
}

fn parse_entry_id(id: &str) -> Option<u64> {
    id.split_once('-').and_then(|(seq, _)| seq.parse().ok())
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated outage; every call fails while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// All entries appended to a topic, in order
    pub fn entries(&self, topic: Topic) -> Vec<LogEntry> {
        self.topics
            .lock()
            .get(&topic)
            .map(|log| {
                log.entries
                    .iter()
                    .map(|(seq, body)| LogEntry {
                        topic,
                        id: entry_id(*seq),
                        body: body.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of entries delivered to the group and not yet acknowledged
    pub fn pending_count(&self, topic: Topic, group: &str) -> usize {
        self.topics
            .lock()
            .get(&topic)
            .and_then(|log| log.groups.get(group))
            .map(|g| g.pending.len())
            .unwrap_or(0)
    }

    /// Entries the group has not yet acknowledged, delivered or not. A
    /// missing group counts every entry in the topic.
    pub fn outstanding(&self, topic: Topic, group: &str) -> usize {
        let topics = self.topics.lock();
        let Some(log) = topics.get(&topic) else {
            return 0;
        };
        match log.groups.get(group) {
            Some(g) => log.entries.len() - g.cursor + g.pending.len(),
            None => log.entries.len(),
        }
    }

    /// How many times an entry has been delivered to the group
    pub fn delivery_count(&self, topic: Topic, group: &str, entry_id: &str) -> u32 {
        let Some(seq) = parse_entry_id(entry_id) else {
            return 0;
        };
        self.topics
            .lock()
            .get(&topic)
            .and_then(|log| log.groups.get(group))
            .and_then(|g| g.pending.get(&seq))
            .map(|p| p.deliveries)
            .unwrap_or(0)
    }

    fn check_available(&self) -> EventLogResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EventLogError::Unavailable);
        }
        Ok(())
    }

    /// Claim idle pending entries, then take new ones, without waiting
    fn take_batch(
        &self,
        topic: Topic,
        group: &str,
        consumer: &str,
        options: &ReadOptions,
    ) -> EventLogResult<Vec<LogEntry>> {
        let mut topics = self.topics.lock();
        let no_group = || EventLogError::NoGroup {
            topic: topic.to_string(),
            group: group.to_string(),
        };
        let log = topics.get_mut(&topic).ok_or_else(no_group)?;
        let TopicLog { entries, groups } = log;
        let state = groups.get_mut(group).ok_or_else(no_group)?;

        let now = Instant::now();
        let mut batch = Vec::new();

        for (seq, pending) in state.pending.iter_mut() {
            if batch.len() >= options.count {
                break;
            }
            if now.saturating_duration_since(pending.delivered_at) < options.claim_idle {
                continue;
            }
            pending.consumer = consumer.to_string();
            pending.delivered_at = now;
            pending.deliveries += 1;

            if let Some((_, body)) = entries.iter().find(|(s, _)| s == seq) {
                batch.push(LogEntry {
                    topic,
                    id: entry_id(*seq),
                    body: body.clone(),
                });
            }
        }

        // Redis serves claimed entries on their own, ahead of new ones
        if !batch.is_empty() {
            return Ok(batch);
        }

        while batch.len() < options.count && state.cursor < entries.len() {
            let (seq, body) = &entries[state.cursor];
            state.cursor += 1;
            state.pending.insert(
                *seq,
                PendingEntry {
                    consumer: consumer.to_string(),
                    delivered_at: now,
                    deliveries: 1,
                },
            );
            batch.push(LogEntry {
                topic,
                id: entry_id(*seq),
                body: body.clone(),
            });
        }

        Ok(batch)
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, topic: Topic, body: &str) -> EventLogResult<String> {
        self.check_available()?;
        let seq = {
            let mut topics = self.topics.lock();
            let log = topics.entry(topic).or_default();
            let seq = log.entries.last().map(|(s, _)| s + 1).unwrap_or(1);
            log.entries.push((seq, body.to_string()));
            seq
        };
        self.appended.send_replace(seq);
        Ok(entry_id(seq))
    }

    async fn ensure_group(&self, topic: Topic, group: &str) -> EventLogResult<()> {
        self.check_available()?;
        let mut topics = self.topics.lock();
        topics
            .entry(topic)
            .or_default()
            .groups
            .entry(group.to_string())
            .or_default();
        Ok(())
    }

    async fn read_group(
        &self,
        topic: Topic,
        group: &str,
        consumer: &str,
        options: &ReadOptions,
    ) -> EventLogResult<Vec<LogEntry>> {
        let deadline = tokio::time::Instant::now() + options.block;
        // Subscribe before checking so an append in between still wakes us
        let mut appended = self.appended.subscribe();

        loop {
            self.check_available()?;
            let batch = self.take_batch(topic, group, consumer, options)?;
            if !batch.is_empty() {
                return Ok(batch);
            }

            match tokio::time::timeout_at(deadline, appended.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) | Err(_) => return Ok(Vec::new()),
            }
        }
    }

    async fn ack(&self, topic: Topic, group: &str, entry_id: &str) -> EventLogResult<()> {
        self.check_available()?;
        let Some(seq) = parse_entry_id(entry_id) else {
            return Ok(());
        };
        if let Some(state) = self
            .topics
            .lock()
            .get_mut(&topic)
            .and_then(|log| log.groups.get_mut(group))
        {
            state.pending.remove(&seq);
        }
        Ok(())
    }
}
