//! Lifecycle event documents
//!
//! An event is built as a `PendingEvent`, then finalized by the log: the log
//! supplies the previous chain hash and the entry hash is computed over the
//! event's identifying fields. Finalized events are immutable.

use chrono::{DateTime, Utc};
use plm_types::{Actor, EventType, ModelId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One immutable audit-trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Unique entry id.
    pub id: Uuid,

    /// Model this event concerns.
    pub model_id: ModelId,

    /// Engine tag of the document at the time of the event.
    pub engine_version: String,

    /// Event timestamp; the trail is ordered by this field alone.
    pub ts: DateTime<Utc>,

    /// Kind of event.
    pub event_type: EventType,

    /// Who initiated it.
    pub actor: Actor,

    /// Open key/value payload: reasons, fix lists, before/after statuses.
    pub meta: HashMap<String, serde_json::Value>,

    /// Hash of the previous entry in the log (chain integrity).
    pub previous_hash: Option<String>,

    /// Hash of this entry.
    pub entry_hash: String,
}

impl LifecycleEvent {
    /// Start building an event. The log finalizes it at append time.
    pub fn record(
        model_id: ModelId,
        engine_version: &str,
        event_type: EventType,
        actor: Actor,
        ts: DateTime<Utc>,
    ) -> PendingEvent {
        PendingEvent {
            id: Uuid::new_v4(),
            model_id,
            engine_version: engine_version.to_string(),
            ts,
            event_type,
            actor,
            meta: HashMap::new(),
        }
    }
}

/// An event that has not yet been hashed into the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEvent {
    pub id: Uuid,
    pub model_id: ModelId,
    pub engine_version: String,
    pub ts: DateTime<Utc>,
    pub event_type: EventType,
    pub actor: Actor,
    pub meta: HashMap<String, serde_json::Value>,
}

impl PendingEvent {
    /// Attach a metadata value. Values that fail to serialize are dropped.
    pub fn meta(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.meta.insert(key.into(), v);
        }
        self
    }

    /// Finalize into an immutable, chain-linked entry.
    pub fn finalize(self, previous_hash: Option<String>) -> LifecycleEvent {
        use sha2::{Digest, Sha256};

        let hash_input = format!(
            "{}{}{}{}{}{}{}",
            self.id,
            self.model_id,
            self.ts.to_rfc3339(),
            self.event_type,
            self.actor,
            serde_json::to_string(&self.meta).unwrap_or_default(),
            previous_hash.as_deref().unwrap_or("")
        );

        let mut hasher = Sha256::new();
        hasher.update(hash_input.as_bytes());
        let entry_hash = hex::encode(hasher.finalize());

        LifecycleEvent {
            id: self.id,
            model_id: self.model_id,
            engine_version: self.engine_version,
            ts: self.ts,
            event_type: self.event_type,
            actor: self.actor,
            meta: self.meta,
            previous_hash,
            entry_hash,
        }
    }
}
