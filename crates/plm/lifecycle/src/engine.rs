//! The transition engine
//!
//! Validates and applies status transitions. Every accepted transition
//! re-reads the current document, plans the new one against the guard table,
//! commits it through a compare-and-set on `updated_at`, and then appends
//! exactly one audit event naming the action. A rejected transition performs
//! no writes. A transition that would change nothing succeeds as a no-op
//! without an event.

use crate::error::{LifecycleError, Result};
use chrono::{DateTime, Utc};
use plm_store::{EventLog, LifecycleEvent, StateStore};
use plm_types::{
    Actor, EventType, LifecycleState, LifecycleStatus, ModelId, TransitionAction, WarmupState,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

/// Result of an accepted (or no-op) transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// False when the request was an idempotent no-op.
    pub changed: bool,

    /// The document after the transition (unchanged for a no-op).
    pub state: LifecycleState,

    /// Event type appended, when one was.
    pub event_type: Option<EventType>,
}

/// The state machine over lifecycle status documents.
pub struct TransitionEngine {
    store: Arc<dyn StateStore>,
    events: Arc<dyn EventLog>,
    event_tx: broadcast::Sender<LifecycleEvent>,
}

impl TransitionEngine {
    pub fn new(store: Arc<dyn StateStore>, events: Arc<dyn EventLog>) -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        Self {
            store,
            events,
            event_tx,
        }
    }

    /// Subscribe to events appended by this engine.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.event_tx.subscribe()
    }

    /// Validate and apply one transition.
    #[instrument(skip(self, reason), fields(model = %model, action = %action))]
    pub async fn apply(
        &self,
        model: ModelId,
        action: TransitionAction,
        actor: Actor,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        let current = self
            .store
            .get(model)
            .await?
            .ok_or(LifecycleError::NotFound(model))?;

        if !action.allowed_in(current.system_mode) {
            return Err(LifecycleError::InvalidTransition {
                from: current.status,
                action: action.name().to_string(),
                reason: format!(
                    "{} is a DEV-only action; {} runs in {}",
                    action.name(),
                    model,
                    current.system_mode
                ),
            });
        }

        let Some(mut next) = plan(&current, &action)? else {
            return Ok(TransitionOutcome {
                changed: false,
                state: current,
                event_type: None,
            });
        };
        next.updated_at = now;

        self.store.update(&next, Some(current.updated_at)).await?;

        info!(
            from = %current.status,
            to = %next.status,
            actor = %actor,
            "lifecycle transition applied"
        );

        // The transition is committed; the audit event is best-effort and
        // its loss must never fail the call.
        let mut pending = LifecycleEvent::record(
            model,
            &next.engine_version,
            action.event_type(),
            actor,
            now,
        )
        .meta("from", current.status.as_str())
        .meta("to", next.status.as_str())
        .meta("action", action.name());
        if let Some(reason) = reason {
            pending = pending.meta("reason", reason);
        }

        match self.events.append(pending).await {
            Ok(event) => {
                let _ = self.event_tx.send(event);
            }
            Err(err) => {
                warn!(error = %err, "event append failed after committed transition");
            }
        }

        Ok(TransitionOutcome {
            changed: true,
            state: next,
            event_type: Some(action.event_type()),
        })
    }

    /// Append an event outside a status transition (drift warnings, warm-up
    /// progress, autofix records). Loss is logged, never fatal.
    pub async fn record_event(&self, pending: plm_store::PendingEvent) {
        match self.events.append(pending).await {
            Ok(event) => {
                let _ = self.event_tx.send(event);
            }
            Err(err) => {
                warn!(error = %err, "event append failed");
            }
        }
    }
}

/// Plan the document produced by `action` from `current`.
///
/// Returns `Ok(None)` when the request is an idempotent no-op, and
/// `InvalidTransition` when the guard fails.
fn plan(
    current: &LifecycleState,
    action: &TransitionAction,
) -> Result<Option<LifecycleState>> {
    use LifecycleStatus::*;

    let mut next = current.clone();

    match (current.status, action) {
        // propose
        (Simulation, TransitionAction::Propose) => {
            next.status = Proposed;
        }
        (Proposed, TransitionAction::Propose) => return Ok(None),
        (from, TransitionAction::Propose) => {
            return Err(reject(from, action, "only a SIMULATION model can be proposed"));
        }

        // start-warmup
        (Simulation | Proposed, TransitionAction::StartWarmup { target_days }) => {
            check_target_days(*target_days)?;
            next.status = Warmup;
            next.warmup = WarmupState::starting(*target_days);
        }
        (Warmup, TransitionAction::StartWarmup { .. }) => return Ok(None),
        (from, TransitionAction::StartWarmup { .. }) => {
            return Err(reject(
                from,
                action,
                "warm-up starts from SIMULATION or PROPOSED; use reset first",
            ));
        }

        // force-warmup (admin override from any non-warm-up status)
        (Warmup, TransitionAction::ForceWarmup { .. }) => return Ok(None),
        (_, TransitionAction::ForceWarmup { target_days }) => {
            check_target_days(*target_days)?;
            next.status = Warmup;
            next.warmup = WarmupState::starting(*target_days);
        }

        // auto-promote (system-only; evidence is the policy's concern)
        (Warmup, TransitionAction::AutoPromote) => {
            next.status = Applied;
        }
        (Applied, TransitionAction::AutoPromote) => return Ok(None),
        (from, TransitionAction::AutoPromote) => {
            return Err(reject(from, action, "auto-promotion only applies to a WARMUP model"));
        }

        // force-apply
        (Simulation | Warmup, TransitionAction::ForceApply) => {
            next.status = AppliedManual;
        }
        (AppliedManual, TransitionAction::ForceApply) => return Ok(None),
        (Revoked, TransitionAction::ForceApply) => {
            return Err(reject(
                Revoked,
                action,
                "cannot force-apply while REVOKED without reset",
            ));
        }
        (from, TransitionAction::ForceApply) => {
            return Err(reject(from, action, "model is already applied or pending warm-up"));
        }

        // drift-critical revocation (system-only)
        (Applied | AppliedManual, TransitionAction::DriftRevoke) => {
            next.status = Revoked;
        }
        (Revoked, TransitionAction::DriftRevoke) => return Ok(None),
        (from, TransitionAction::DriftRevoke) => {
            return Err(reject(
                from,
                action,
                "drift revocation only applies to an applied model",
            ));
        }

        // force-revoke
        (Applied | AppliedManual | Warmup, TransitionAction::ForceRevoke) => {
            next.status = Revoked;
        }
        (Revoked, TransitionAction::ForceRevoke) => return Ok(None),
        (from, TransitionAction::ForceRevoke) => {
            return Err(reject(from, action, "nothing to revoke at this status"));
        }

        // reset (mode gate is checked before planning)
        (_, TransitionAction::Reset) => {
            next.status = Simulation;
            next.zero_counters();
        }
    }

    if next == *current {
        return Ok(None);
    }
    Ok(Some(next))
}

fn check_target_days(target_days: u32) -> Result<()> {
    if target_days == 0 {
        return Err(LifecycleError::Validation(
            "warm-up target_days must be greater than zero".into(),
        ));
    }
    Ok(())
}

fn reject(from: LifecycleStatus, action: &TransitionAction, reason: &str) -> LifecycleError {
    LifecycleError::InvalidTransition {
        from,
        action: action.name().to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plm_store::{EventQuery, MemoryEventLog, MemoryStateStore};
    use plm_types::SystemMode;

    async fn engine_with(status: LifecycleStatus) -> (TransitionEngine, Arc<MemoryStateStore>) {
        let store = Arc::new(MemoryStateStore::new());
        let events = Arc::new(MemoryEventLog::new());
        let mut state = LifecycleState::initial(ModelId::Btc, Utc::now());
        state.status = status;
        store.upsert(&state).await.unwrap();
        (TransitionEngine::new(store.clone(), events), store)
    }

    #[tokio::test]
    async fn propose_from_simulation() {
        let (engine, _) = engine_with(LifecycleStatus::Simulation).await;
        let outcome = engine
            .apply(ModelId::Btc, TransitionAction::Propose, Actor::Admin, None, Utc::now())
            .await
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.state.status, LifecycleStatus::Proposed);
    }

    #[tokio::test]
    async fn propose_from_applied_rejected() {
        let (engine, _) = engine_with(LifecycleStatus::Applied).await;
        let err = engine
            .apply(ModelId::Btc, TransitionAction::Propose, Actor::Admin, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn start_warmup_resets_progress() {
        let (engine, store) = engine_with(LifecycleStatus::Proposed).await;
        let outcome = engine
            .apply(
                ModelId::Btc,
                TransitionAction::StartWarmup { target_days: 14 },
                Actor::Admin,
                None,
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.state.status, LifecycleStatus::Warmup);
        assert_eq!(outcome.state.warmup.target_days, 14);
        assert_eq!(outcome.state.warmup.resolved_days, 0);
        assert_eq!(outcome.state.warmup.progress_pct, 0);

        let stored = store.get(ModelId::Btc).await.unwrap().unwrap();
        assert_eq!(stored.status, LifecycleStatus::Warmup);
    }

    #[tokio::test]
    async fn start_warmup_while_warming_is_a_noop() {
        let (engine, store) = engine_with(LifecycleStatus::Warmup).await;
        let mut state = store.get(ModelId::Btc).await.unwrap().unwrap();
        state.warmup.resolved_days = 7;
        state.warmup.progress_pct = 23;
        store.upsert(&state).await.unwrap();

        let outcome = engine
            .apply(
                ModelId::Btc,
                TransitionAction::StartWarmup { target_days: 30 },
                Actor::Admin,
                None,
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.state.warmup.resolved_days, 7);
        assert!(outcome.event_type.is_none());
    }

    #[tokio::test]
    async fn zero_target_days_rejected() {
        let (engine, _) = engine_with(LifecycleStatus::Simulation).await;
        let err = engine
            .apply(
                ModelId::Btc,
                TransitionAction::StartWarmup { target_days: 0 },
                Actor::Admin,
                None,
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
    }

    #[tokio::test]
    async fn force_apply_from_revoked_rejected_without_reset() {
        let (engine, _) = engine_with(LifecycleStatus::Revoked).await;
        let err = engine
            .apply(ModelId::Btc, TransitionAction::ForceApply, Actor::Admin, None, Utc::now())
            .await
            .unwrap_err();
        match err {
            LifecycleError::InvalidTransition { reason, .. } => {
                assert!(reason.contains("without reset"));
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn force_warmup_restarts_from_revoked() {
        let (engine, _) = engine_with(LifecycleStatus::Revoked).await;
        let outcome = engine
            .apply(
                ModelId::Btc,
                TransitionAction::ForceWarmup { target_days: 30 },
                Actor::Admin,
                Some("restart probation after remediation"),
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.state.status, LifecycleStatus::Warmup);
        assert_eq!(outcome.event_type, Some(EventType::ForceWarmup));
    }

    #[tokio::test]
    async fn reset_rejected_in_prod() {
        let (engine, store) = engine_with(LifecycleStatus::Applied).await;
        let mut state = store.get(ModelId::Btc).await.unwrap().unwrap();
        state.system_mode = SystemMode::Prod;
        store.upsert(&state).await.unwrap();

        let err = engine
            .apply(ModelId::Btc, TransitionAction::Reset, Actor::Admin, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn reset_in_dev_zeroes_counters_from_any_status() {
        for status in [
            LifecycleStatus::Proposed,
            LifecycleStatus::Warmup,
            LifecycleStatus::Applied,
            LifecycleStatus::AppliedManual,
            LifecycleStatus::Revoked,
        ] {
            let (engine, store) = engine_with(status).await;
            let mut state = store.get(ModelId::Btc).await.unwrap().unwrap();
            state.live.live_samples = 50;
            state.warmup.resolved_days = 12;
            store.upsert(&state).await.unwrap();

            let outcome = engine
                .apply(ModelId::Btc, TransitionAction::Reset, Actor::Admin, None, Utc::now())
                .await
                .unwrap();
            assert_eq!(outcome.state.status, LifecycleStatus::Simulation, "from {status}");
            assert_eq!(outcome.state.live.live_samples, 0);
            assert_eq!(outcome.state.warmup.resolved_days, 0);
        }
    }

    #[tokio::test]
    async fn repeated_revoke_appends_no_duplicate_event() {
        let (engine, _) = engine_with(LifecycleStatus::Applied).await;
        let events = engine.events.clone();

        let first = engine
            .apply(ModelId::Btc, TransitionAction::ForceRevoke, Actor::Admin, None, Utc::now())
            .await
            .unwrap();
        assert!(first.changed);

        let second = engine
            .apply(ModelId::Btc, TransitionAction::ForceRevoke, Actor::Admin, None, Utc::now())
            .await
            .unwrap();
        assert!(!second.changed);

        let revokes = events
            .query(&EventQuery::for_model(ModelId::Btc).with_type(EventType::Revoke))
            .await
            .unwrap();
        assert_eq!(revokes.len(), 1);
    }

    #[tokio::test]
    async fn accepted_transition_records_before_and_after() {
        let (engine, _) = engine_with(LifecycleStatus::Simulation).await;
        let events = engine.events.clone();

        engine
            .apply(
                ModelId::Btc,
                TransitionAction::ForceApply,
                Actor::Admin,
                Some("pilot rollout"),
                Utc::now(),
            )
            .await
            .unwrap();

        let appended = events
            .query(&EventQuery::for_model(ModelId::Btc))
            .await
            .unwrap();
        assert_eq!(appended.len(), 1);
        let event = &appended[0];
        assert_eq!(event.event_type, EventType::ForceApply);
        assert_eq!(event.meta["from"], serde_json::json!("SIMULATION"));
        assert_eq!(event.meta["to"], serde_json::json!("APPLIED_MANUAL"));
        assert_eq!(event.meta["reason"], serde_json::json!("pilot rollout"));
    }

    #[tokio::test]
    async fn missing_model_is_not_found() {
        let store = Arc::new(MemoryStateStore::new());
        let events = Arc::new(MemoryEventLog::new());
        let engine = TransitionEngine::new(store, events);

        let err = engine
            .apply(ModelId::Spx, TransitionAction::Propose, Actor::Admin, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(ModelId::Spx)));
    }
}
