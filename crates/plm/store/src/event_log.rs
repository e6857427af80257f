//! Append-only lifecycle event log
//!
//! Appends finalize the pending event against the hash chain; reads filter
//! and order by timestamp. Entries are never mutated or deleted; retention
//! is the caller's concern, not the log's.

use crate::chain::EventChain;
use crate::error::Result;
use crate::event::{LifecycleEvent, PendingEvent};
use crate::query::EventQuery;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Append-only, time-ordered record of lifecycle events.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Finalize and append an event; returns the chain-linked entry.
    async fn append(&self, event: PendingEvent) -> Result<LifecycleEvent>;

    /// Query events, bounded and ordered per the query.
    async fn query(&self, query: &EventQuery) -> Result<Vec<LifecycleEvent>>;

    /// Total entries appended.
    async fn entry_count(&self) -> Result<u64>;
}

/// In-memory event log for development and tests.
pub struct MemoryEventLog {
    entries: RwLock<Vec<LifecycleEvent>>,
    chain: RwLock<EventChain>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            chain: RwLock::new(EventChain::new()),
        }
    }

    /// All entries in append order (test helper).
    pub fn entries(&self) -> Vec<LifecycleEvent> {
        self.entries.read().clone()
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append(&self, pending: PendingEvent) -> Result<LifecycleEvent> {
        let mut chain = self.chain.write();
        let event = pending.finalize(chain.previous_hash());
        chain.update(&event);

        self.entries.write().push(event.clone());
        Ok(event)
    }

    async fn query(&self, query: &EventQuery) -> Result<Vec<LifecycleEvent>> {
        Ok(query.apply(&self.entries.read()))
    }

    async fn entry_count(&self) -> Result<u64> {
        Ok(self.chain.read().entry_count())
    }
}

/// File-backed event log: one JSON entry per line, append-only.
pub struct FileEventLog {
    path: PathBuf,
    chain: Arc<RwLock<EventChain>>,
}

impl FileEventLog {
    /// Open (or create) a log file, resuming the hash chain from its tail.
    pub async fn new(path: PathBuf) -> Result<Self> {
        let chain = if path.exists() {
            Self::load_chain_state(&path).await?
        } else {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            EventChain::new()
        };

        Ok(Self {
            path,
            chain: Arc::new(RwLock::new(chain)),
        })
    }

    async fn load_chain_state(path: &PathBuf) -> Result<EventChain> {
        let file = File::open(path).await?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let mut last_hash = None;
        let mut count = 0u64;

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let event: LifecycleEvent = serde_json::from_str(&line)?;
            last_hash = Some(event.entry_hash);
            count += 1;
        }

        Ok(EventChain::from_state(last_hash, count))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read every entry in append order.
    pub async fn read_all(&self) -> Result<Vec<LifecycleEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path).await?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut events = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }

        Ok(events)
    }
}

#[async_trait]
impl EventLog for FileEventLog {
    async fn append(&self, pending: PendingEvent) -> Result<LifecycleEvent> {
        // Scope the chain lock so it is not held across the file await.
        let (event, json) = {
            let mut chain = self.chain.write();
            let event = pending.finalize(chain.previous_hash());
            chain.update(&event);
            let json = serde_json::to_string(&event)?;
            (event, json)
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(json.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;

        Ok(event)
    }

    async fn query(&self, query: &EventQuery) -> Result<Vec<LifecycleEvent>> {
        let events = self.read_all().await?;
        Ok(query.apply(&events))
    }

    async fn entry_count(&self) -> Result<u64> {
        Ok(self.chain.read().entry_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::verify_chain;
    use chrono::Utc;
    use plm_types::{Actor, EventType, ModelId};

    fn pending(model: ModelId, event_type: EventType) -> PendingEvent {
        LifecycleEvent::record(model, "v2.1", event_type, Actor::System, Utc::now())
    }

    #[tokio::test]
    async fn memory_log_chains_appends() {
        let log = MemoryEventLog::new();

        let first = log
            .append(pending(ModelId::Btc, EventType::Generated))
            .await
            .unwrap();
        let second = log
            .append(pending(ModelId::Btc, EventType::WarmupStart))
            .await
            .unwrap();

        assert_eq!(log.entry_count().await.unwrap(), 2);
        assert_eq!(second.previous_hash, Some(first.entry_hash));
        assert!(verify_chain(&log.entries()).valid);
    }

    #[tokio::test]
    async fn memory_log_query_filters_and_bounds() {
        let log = MemoryEventLog::new();
        log.append(pending(ModelId::Btc, EventType::Generated))
            .await
            .unwrap();
        log.append(pending(ModelId::Spx, EventType::Generated))
            .await
            .unwrap();
        log.append(pending(ModelId::Btc, EventType::WarmupStart))
            .await
            .unwrap();

        let btc = log
            .query(&EventQuery::for_model(ModelId::Btc))
            .await
            .unwrap();
        assert_eq!(btc.len(), 2);

        let bounded = log.query(&EventQuery::all().with_limit(1)).await.unwrap();
        assert_eq!(bounded.len(), 1);
    }

    #[tokio::test]
    async fn file_log_appends_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lifecycle-events.jsonl");

        let log = FileEventLog::new(path.clone()).await.unwrap();
        log.append(pending(ModelId::Btc, EventType::Generated))
            .await
            .unwrap();
        log.append(pending(ModelId::Btc, EventType::WarmupStart))
            .await
            .unwrap();
        log.append(pending(ModelId::Btc, EventType::WarmupProgress))
            .await
            .unwrap();

        assert_eq!(log.entry_count().await.unwrap(), 3);
        let events = log.read_all().await.unwrap();
        assert_eq!(events.len(), 3);
        assert!(verify_chain(&events).valid);
    }

    #[tokio::test]
    async fn file_log_resumes_chain_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lifecycle-events.jsonl");

        {
            let log = FileEventLog::new(path.clone()).await.unwrap();
            log.append(pending(ModelId::Spx, EventType::Generated))
                .await
                .unwrap();
            log.append(pending(ModelId::Spx, EventType::WarmupStart))
                .await
                .unwrap();
        }

        {
            let log = FileEventLog::new(path.clone()).await.unwrap();
            assert_eq!(log.entry_count().await.unwrap(), 2);

            log.append(pending(ModelId::Spx, EventType::WarmupProgress))
                .await
                .unwrap();

            let events = log.read_all().await.unwrap();
            assert_eq!(events.len(), 3);
            assert!(verify_chain(&events).valid);
        }
    }
}
