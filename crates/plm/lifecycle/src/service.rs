//! The lifecycle service facade
//!
//! Composes the transition engine, drift monitor, promotion policy,
//! integrity enforcer, and readiness evaluator behind one API. Dependencies
//! are injected at construction; there is no process-wide singleton, so
//! tests run against in-memory stores.

use crate::drift::{DriftMonitor, DriftOutcome};
use crate::engine::{TransitionEngine, TransitionOutcome};
use crate::error::{LifecycleError, Result};
use crate::integrity::IntegrityEnforcer;
use crate::promotion::{PromotionOutcome, PromotionPolicy, PromotionReport};
use crate::readiness::CombinedReadinessEvaluator;
use chrono::Utc;
use plm_store::{EventLog, EventQuery, LifecycleEvent, StateStore};
use plm_types::{
    Actor, CombinedReadiness, DriftSeverity, EventType, LifecycleState, LifecycleStatus, ModelId,
    TransitionAction,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, instrument};

/// Default bound for event reads when the caller gives none.
const DEFAULT_EVENT_LIMIT: usize = 100;

/// Per-model diagnostic snapshot: state, dry-run eligibility, recent trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDiagnostics {
    pub state: LifecycleState,
    pub promotion: PromotionReport,
    pub recent_events: Vec<LifecycleEvent>,
    pub constitution_bound: bool,
}

/// Unified entry point for lifecycle operations.
pub struct LifecycleService {
    store: Arc<dyn StateStore>,
    events: Arc<dyn EventLog>,
    engine: Arc<TransitionEngine>,
    drift: DriftMonitor,
    promotion: PromotionPolicy,
    readiness: CombinedReadinessEvaluator,
    integrity: IntegrityEnforcer,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn StateStore>, events: Arc<dyn EventLog>) -> Self {
        let engine = Arc::new(TransitionEngine::new(store.clone(), events.clone()));
        Self {
            drift: DriftMonitor::new(store.clone(), engine.clone()),
            promotion: PromotionPolicy::new(store.clone(), engine.clone()),
            readiness: CombinedReadinessEvaluator::new(store.clone()),
            integrity: IntegrityEnforcer::new(),
            store,
            events,
            engine,
        }
    }

    // --- Component access (used by the daily-run adapter) ---

    pub fn store(&self) -> Arc<dyn StateStore> {
        self.store.clone()
    }

    pub fn event_log(&self) -> Arc<dyn EventLog> {
        self.events.clone()
    }

    pub fn engine(&self) -> Arc<TransitionEngine> {
        self.engine.clone()
    }

    pub fn drift_monitor(&self) -> &DriftMonitor {
        &self.drift
    }

    pub fn promotion_policy(&self) -> &PromotionPolicy {
        &self.promotion
    }

    pub fn integrity_enforcer(&self) -> &IntegrityEnforcer {
        &self.integrity
    }

    // --- Initialization ---

    /// Ensure a default document exists for every tracked model. Idempotent;
    /// existing documents are left untouched.
    #[instrument(skip(self))]
    pub async fn init_defaults(&self) -> Result<Vec<LifecycleState>> {
        let now = Utc::now();
        let mut states = Vec::with_capacity(ModelId::ALL.len());

        for model in ModelId::ALL {
            if let Some(existing) = self.store.get(model).await? {
                states.push(existing);
                continue;
            }

            let state = LifecycleState::initial(model, now);
            self.store.upsert(&state).await?;
            self.engine
                .record_event(
                    LifecycleEvent::record(
                        model,
                        &state.engine_version,
                        EventType::Generated,
                        Actor::System,
                        now,
                    )
                    .meta("reason", "initial state created"),
                )
                .await;
            info!(model = %model, "lifecycle state initialized");
            states.push(state);
        }

        Ok(states)
    }

    // --- Observability ---

    pub async fn state(&self, model: ModelId) -> Result<LifecycleState> {
        self.store
            .get(model)
            .await?
            .ok_or(LifecycleError::NotFound(model))
    }

    pub async fn all_states(&self) -> Result<Vec<LifecycleState>> {
        Ok(self.store.list_all().await?)
    }

    pub async fn combined_readiness(&self) -> Result<CombinedReadiness> {
        self.readiness.evaluate().await
    }

    pub async fn diagnostics(&self, model: ModelId) -> Result<ModelDiagnostics> {
        let state = self.state(model).await?;
        let promotion = self.promotion.evaluate(&state);
        let recent_events = self
            .events
            .query(&EventQuery::for_model(model).with_limit(20))
            .await?;
        let constitution_bound = state.constitution_bound();

        Ok(ModelDiagnostics {
            state,
            promotion,
            recent_events,
            constitution_bound,
        })
    }

    /// Events across the log, most recent first. `model = None` spans all
    /// tracked models.
    pub async fn events(
        &self,
        model: Option<ModelId>,
        limit: Option<usize>,
    ) -> Result<Vec<LifecycleEvent>> {
        let query = EventQuery {
            model,
            event_type: None,
            limit: Some(limit.unwrap_or(DEFAULT_EVENT_LIMIT)),
            ascending: false,
        };
        Ok(self.events.query(&query).await?)
    }

    /// Live feed of appended events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.engine.subscribe()
    }

    // --- Admin transitions ---

    /// Apply an admin-requested transition. System-driven actions
    /// (auto-promote, drift-revoke) cannot be requested through this path.
    #[instrument(skip(self, reason), fields(model = %model, action = %action))]
    pub async fn transition(
        &self,
        model: ModelId,
        action: TransitionAction,
        actor: Actor,
        reason: Option<&str>,
    ) -> Result<TransitionOutcome> {
        if action.is_system_only() {
            return Err(LifecycleError::Validation(format!(
                "{} is system-driven and cannot be requested directly",
                action.name()
            )));
        }
        self.engine
            .apply(model, action, actor, reason, Utc::now())
            .await
    }

    pub async fn propose(&self, model: ModelId, reason: Option<&str>) -> Result<TransitionOutcome> {
        self.transition(model, TransitionAction::Propose, Actor::Admin, reason)
            .await
    }

    pub async fn start_warmup(
        &self,
        model: ModelId,
        target_days: u32,
    ) -> Result<TransitionOutcome> {
        self.transition(
            model,
            TransitionAction::StartWarmup { target_days },
            Actor::Admin,
            None,
        )
        .await
    }

    pub async fn force_warmup(
        &self,
        model: ModelId,
        target_days: u32,
        reason: Option<&str>,
    ) -> Result<TransitionOutcome> {
        self.transition(
            model,
            TransitionAction::ForceWarmup { target_days },
            Actor::Admin,
            reason,
        )
        .await
    }

    pub async fn force_apply(&self, model: ModelId, reason: &str) -> Result<TransitionOutcome> {
        self.transition(model, TransitionAction::ForceApply, Actor::Admin, Some(reason))
            .await
    }

    pub async fn force_revoke(&self, model: ModelId, reason: &str) -> Result<TransitionOutcome> {
        self.transition(model, TransitionAction::ForceRevoke, Actor::Admin, Some(reason))
            .await
    }

    pub async fn reset_simulation(&self, model: ModelId, reason: &str) -> Result<TransitionOutcome> {
        self.transition(model, TransitionAction::Reset, Actor::Admin, Some(reason))
            .await
    }

    // --- Promotion ---

    pub async fn check_and_promote(&self, model: ModelId) -> Result<PromotionOutcome> {
        self.promotion.check_and_promote(model, Utc::now()).await
    }

    pub async fn validate_for_promotion(&self, model: ModelId) -> Result<PromotionReport> {
        self.promotion.validate(model).await
    }

    // --- Drift ---

    pub async fn record_drift(
        &self,
        model: ModelId,
        severity: DriftSeverity,
    ) -> Result<DriftOutcome> {
        self.drift.observe(model, severity, Utc::now()).await
    }

    // --- Dev-only rehearsal ---

    /// Directly override a model's status for rehearsal. Dev mode only; the
    /// routing layer parses status tags, so a malformed tag fails there as a
    /// validation error before reaching this call.
    #[instrument(skip(self), fields(model = %model, status = %status))]
    pub async fn simulate_status(
        &self,
        model: ModelId,
        status: LifecycleStatus,
    ) -> Result<LifecycleState> {
        let current = self.state(model).await?;
        if !current.system_mode.is_dev() {
            return Err(LifecycleError::InvalidTransition {
                from: current.status,
                action: "simulate-status".into(),
                reason: format!("simulate-status is a DEV-only action; {model} runs in PROD"),
            });
        }
        if current.status == status {
            return Ok(current);
        }

        let now = Utc::now();
        let mut next = current.clone();
        next.status = status;
        next.updated_at = now;
        self.store.update(&next, Some(current.updated_at)).await?;

        self.engine
            .record_event(
                LifecycleEvent::record(
                    model,
                    &next.engine_version,
                    EventType::StatusChanged,
                    Actor::Admin,
                    now,
                )
                .meta("from", current.status.as_str())
                .meta("to", status.as_str())
                .meta("simulated", true),
            )
            .await;

        Ok(next)
    }

    /// Enable dev truth mode across every tracked model. Rejected unless all
    /// models run in Dev.
    #[instrument(skip(self))]
    pub async fn enable_dev_truth_mode(&self) -> Result<()> {
        let states = self.store.list_all().await?;
        if let Some(prod) = states.iter().find(|s| !s.system_mode.is_dev()) {
            return Err(LifecycleError::Validation(format!(
                "dev truth mode requires DEV mode; {} runs in PROD",
                prod.model_id
            )));
        }

        let now = Utc::now();
        for state in &states {
            self.engine
                .record_event(
                    LifecycleEvent::record(
                        state.model_id,
                        &state.engine_version,
                        EventType::DevTruthMode,
                        Actor::Admin,
                        now,
                    )
                    .meta("reason", "synthetic outcome resolution enabled"),
                )
                .await;
        }
        info!("dev truth mode enabled for all models");
        Ok(())
    }
}
