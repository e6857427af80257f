//! PLM Store - Persistence for lifecycle state and events
//!
//! Two logical collections back the lifecycle core:
//!
//! - **State**: one document per model, keyed by `ModelId`, written through a
//!   compare-and-set on `updated_at` so concurrent writers serialize per
//!   model without an in-process lock.
//! - **Events**: an append-only, hash-chained audit trail ordered by
//!   timestamp. Entries are finalized (hashed and linked) by the log at
//!   append time and are never mutated or deleted.
//!
//! In-memory implementations cover tests and development; the JSONL file log
//! covers single-node persistence.

#![deny(unsafe_code)]

pub mod chain;
pub mod error;
pub mod event;
pub mod event_log;
pub mod query;
pub mod state_store;

pub use chain::{verify_chain, ChainVerification, EventChain};
pub use error::{Result, StoreError};
pub use event::{LifecycleEvent, PendingEvent};
pub use event_log::{EventLog, FileEventLog, MemoryEventLog};
pub use query::EventQuery;
pub use state_store::{MemoryStateStore, StateStore};
