//! Event-chain integrity

use crate::event::LifecycleEvent;

/// Tracks the head of the hash chain across appends.
#[derive(Debug, Default)]
pub struct EventChain {
    last_hash: Option<String>,
    entry_count: u64,
}

impl EventChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a chain from persisted state (e.g. after reopening a log file).
    pub fn from_state(last_hash: Option<String>, entry_count: u64) -> Self {
        Self {
            last_hash,
            entry_count,
        }
    }

    /// Hash to link into the next entry.
    pub fn previous_hash(&self) -> Option<String> {
        self.last_hash.clone()
    }

    /// Advance the chain past a freshly appended entry.
    pub fn update(&mut self, event: &LifecycleEvent) {
        self.last_hash = Some(event.entry_hash.clone());
        self.entry_count += 1;
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }
}

/// Result of verifying a stored event sequence.
#[derive(Debug, Clone)]
pub struct ChainVerification {
    pub valid: bool,
    pub total_entries: usize,
    pub first_invalid_index: Option<usize>,
    pub error_message: Option<String>,
}

/// Verify that a sequence of events (in append order) forms an unbroken,
/// untampered chain.
pub fn verify_chain(events: &[LifecycleEvent]) -> ChainVerification {
    let mut result = ChainVerification {
        valid: true,
        total_entries: events.len(),
        first_invalid_index: None,
        error_message: None,
    };

    for (i, event) in events.iter().enumerate() {
        if i > 0 {
            let expected_prev = &events[i - 1].entry_hash;
            if event.previous_hash.as_ref() != Some(expected_prev) {
                result.valid = false;
                result.first_invalid_index = Some(i);
                result.error_message = Some(format!(
                    "event {} has a broken chain link (expected prev {}, got {:?})",
                    event.id, expected_prev, event.previous_hash
                ));
                return result;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LifecycleEvent;
    use chrono::Utc;
    use plm_types::{Actor, EventType, ModelId};

    fn event_at(prev: Option<String>) -> LifecycleEvent {
        LifecycleEvent::record(
            ModelId::Spx,
            "v2.1",
            EventType::WarmupProgress,
            Actor::System,
            Utc::now(),
        )
        .finalize(prev)
    }

    #[test]
    fn intact_chain_verifies() {
        let mut chain = EventChain::new();
        let mut events = Vec::new();
        for _ in 0..4 {
            let event = event_at(chain.previous_hash());
            chain.update(&event);
            events.push(event);
        }

        let result = verify_chain(&events);
        assert!(result.valid);
        assert_eq!(chain.entry_count(), 4);
    }

    #[test]
    fn broken_link_detected() {
        let first = event_at(None);
        let detached = event_at(Some("0000".into()));

        let result = verify_chain(&[first, detached]);
        assert!(!result.valid);
        assert_eq!(result.first_invalid_index, Some(1));
    }

    #[test]
    fn empty_chain_is_valid() {
        assert!(verify_chain(&[]).valid);
    }
}
