//! Event query support

use crate::event::LifecycleEvent;
use plm_types::{EventType, ModelId};

/// Filter over the event log. Results are ordered by timestamp,
/// most recent first by default.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Restrict to one model; `None` spans all models.
    pub model: Option<ModelId>,

    /// Restrict to one event type.
    pub event_type: Option<EventType>,

    /// Maximum number of results.
    pub limit: Option<usize>,

    /// Oldest-first instead of the default newest-first.
    pub ascending: bool,
}

impl EventQuery {
    /// All events for one model, newest first.
    pub fn for_model(model: ModelId) -> Self {
        Self {
            model: Some(model),
            ..Self::default()
        }
    }

    /// All events across models, newest first.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn oldest_first(mut self) -> Self {
        self.ascending = true;
        self
    }

    fn matches(&self, event: &LifecycleEvent) -> bool {
        if let Some(model) = self.model {
            if event.model_id != model {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        true
    }

    /// Apply this query to a slice of events.
    pub fn apply(&self, events: &[LifecycleEvent]) -> Vec<LifecycleEvent> {
        let mut results: Vec<LifecycleEvent> =
            events.iter().filter(|e| self.matches(e)).cloned().collect();

        if self.ascending {
            results.sort_by(|a, b| a.ts.cmp(&b.ts));
        } else {
            results.sort_by(|a, b| b.ts.cmp(&a.ts));
        }

        if let Some(limit) = self.limit {
            results.truncate(limit);
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use plm_types::Actor;

    fn event(model: ModelId, event_type: EventType, offset_hours: i64) -> LifecycleEvent {
        LifecycleEvent::record(
            model,
            "v2.1",
            event_type,
            Actor::System,
            Utc::now() - Duration::hours(offset_hours),
        )
        .finalize(None)
    }

    #[test]
    fn filters_by_model() {
        let events = vec![
            event(ModelId::Btc, EventType::Generated, 3),
            event(ModelId::Spx, EventType::Generated, 2),
            event(ModelId::Btc, EventType::WarmupStart, 1),
        ];

        let results = EventQuery::for_model(ModelId::Btc).apply(&events);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|e| e.model_id == ModelId::Btc));
    }

    #[test]
    fn newest_first_with_limit() {
        let events = vec![
            event(ModelId::Btc, EventType::Generated, 5),
            event(ModelId::Btc, EventType::WarmupStart, 3),
            event(ModelId::Btc, EventType::WarmupProgress, 1),
        ];

        let results = EventQuery::for_model(ModelId::Btc).with_limit(2).apply(&events);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].event_type, EventType::WarmupProgress);
        assert!(results[0].ts > results[1].ts);
    }

    #[test]
    fn filters_by_event_type() {
        let events = vec![
            event(ModelId::Spx, EventType::DriftWarn, 2),
            event(ModelId::Spx, EventType::WarmupProgress, 1),
        ];

        let results = EventQuery::all().with_type(EventType::DriftWarn).apply(&events);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].event_type, EventType::DriftWarn);
    }
}
