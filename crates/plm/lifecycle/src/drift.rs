//! Drift monitoring
//!
//! One severity observation per cycle. The drift fields are written
//! unconditionally; escalation to CRITICAL while the model serves production
//! triggers the drift-revoke transition. De-escalation never auto-recovers a
//! revoked model; recovery is an explicit admin action.

use crate::engine::TransitionEngine;
use crate::error::{LifecycleError, Result};
use chrono::{DateTime, Utc};
use plm_store::{LifecycleEvent, StateStore};
use plm_types::{Actor, DriftSeverity, EventType, LifecycleState, ModelId, TransitionAction};
use std::sync::Arc;
use tracing::{instrument, warn};

/// Result of folding one severity observation into the state.
#[derive(Debug, Clone)]
pub struct DriftOutcome {
    pub severity: DriftSeverity,
    pub previous: DriftSeverity,

    /// True when this observation revoked the model.
    pub revoked: bool,

    /// The document after the observation (and any revocation).
    pub state: LifecycleState,
}

/// Applies freshly computed drift severities to lifecycle state.
pub struct DriftMonitor {
    store: Arc<dyn StateStore>,
    engine: Arc<TransitionEngine>,
}

impl DriftMonitor {
    pub fn new(store: Arc<dyn StateStore>, engine: Arc<TransitionEngine>) -> Self {
        Self { store, engine }
    }

    /// Record one severity observation for a model.
    #[instrument(skip(self), fields(model = %model, severity = %severity))]
    pub async fn observe(
        &self,
        model: ModelId,
        severity: DriftSeverity,
        now: DateTime<Utc>,
    ) -> Result<DriftOutcome> {
        let current = self
            .store
            .get(model)
            .await?
            .ok_or(LifecycleError::NotFound(model))?;
        let previous = current.drift.severity;

        let mut next = current.clone();
        next.drift.severity = severity;
        next.drift.last_checked_at = Some(now);
        next.updated_at = now;
        self.store.update(&next, Some(current.updated_at)).await?;

        let mut revoked = false;
        let mut state = next;

        if severity == DriftSeverity::Critical && state.status.is_applied() {
            warn!(model = %model, "drift CRITICAL while applied; auto-revoking");
            let outcome = self
                .engine
                .apply(
                    model,
                    TransitionAction::DriftRevoke,
                    Actor::System,
                    Some("drift severity escalated to CRITICAL"),
                    now,
                )
                .await?;
            revoked = outcome.changed;
            state = outcome.state;
        } else if severity == DriftSeverity::Warn && previous != DriftSeverity::Warn {
            // Observability only; re-observing the same WARN stays silent so
            // cycle re-runs append nothing new.
            self.engine
                .record_event(
                    LifecycleEvent::record(
                        model,
                        &state.engine_version,
                        EventType::DriftWarn,
                        Actor::System,
                        now,
                    )
                    .meta("previous", previous.as_str())
                    .meta("severity", severity.as_str()),
                )
                .await;
        }

        Ok(DriftOutcome {
            severity,
            previous,
            revoked,
            state,
        })
    }
}
