//! The daily cycle runner
//!
//! Drives one model through the fixed step sequence against the lifecycle
//! service's components. Steps re-read the document immediately before
//! acting and commit through the store's compare-and-set, so an interrupted
//! cycle can be re-run safely: the cycle key short-circuits anything that
//! already happened today.

use crate::steps::{
    cycle_key, DriftCheckOutcome, HookSettleOutcome, IntegrityOutcome, LiveSampleOutcome,
    WarmupProgressOutcome,
};
use chrono::{DateTime, Utc};
use plm_lifecycle::{LifecycleError, LifecycleService, PromotionOutcome, Result};
use plm_store::{LifecycleEvent, StateStore};
use plm_types::{progress_pct, Actor, DriftSeverity, EventType, LifecycleStatus, ModelId};
use std::sync::Arc;
use tracing::{info, instrument};

/// External evidence for one model's cycle.
#[derive(Debug, Clone)]
pub struct CycleInput {
    pub model: ModelId,

    /// Outcomes newly resolved since the previous cycle.
    pub resolved_outcomes: u64,

    /// Severity computed by the drift pipeline for this cycle.
    pub drift_severity: DriftSeverity,

    /// The cycle's timestamp; its UTC date is the idempotence key.
    pub now: DateTime<Utc>,
}

/// Per-step results for one model's cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub model: ModelId,
    pub cycle_key: String,
    pub live: LiveSampleOutcome,
    pub drift: DriftCheckOutcome,
    pub settle: HookSettleOutcome,
    pub warmup: WarmupProgressOutcome,
    pub promotion: PromotionOutcome,
    pub integrity: IntegrityOutcome,

    /// Operator-facing notes: auto-revocations, promotions, integrity fixes.
    pub warnings: Vec<String>,
}

/// Sequences the fixed per-cycle step order for one model at a time.
pub struct DailyCycleRunner {
    service: Arc<LifecycleService>,
}

impl DailyCycleRunner {
    pub fn new(service: Arc<LifecycleService>) -> Self {
        Self { service }
    }

    /// Run the full cycle for one model.
    #[instrument(skip(self, input), fields(model = %input.model, key = %cycle_key(input.now)))]
    pub async fn run(&self, input: CycleInput) -> Result<CycleReport> {
        let key = cycle_key(input.now);
        let mut warnings = Vec::new();

        let status_at_start = self.service.state(input.model).await?.status;

        // 1. Live-sample ingest
        let live = self.ingest_live_samples(&input, &key).await?;

        // 2. Drift check
        let drift_outcome = self
            .service
            .drift_monitor()
            .observe(input.model, input.drift_severity, input.now)
            .await?;
        if drift_outcome.revoked {
            warnings.push(format!(
                "{} auto-revoked (drift CRITICAL)",
                input.model
            ));
        }
        let drift = DriftCheckOutcome {
            severity: drift_outcome.severity,
            previous: drift_outcome.previous,
            revoked: drift_outcome.revoked,
        };

        // 3. Settlement diff: record what the earlier steps changed; the
        // transition that caused it already appended its own event.
        let status_after_hooks = drift_outcome.state.status;
        let settle = HookSettleOutcome {
            status_before: status_at_start,
            status_after: status_after_hooks,
            transition: (status_at_start != status_after_hooks)
                .then(|| format!("{status_at_start} -> {status_after_hooks}")),
        };

        // 4. Warm-up advance
        let warmup = self.advance_warmup(&input, &key).await?;

        // 5. Auto-promotion
        let promotion = self
            .service
            .promotion_policy()
            .check_and_promote(input.model, input.now)
            .await?;
        if promotion.promoted() {
            warnings.push(format!("{} auto-promoted to APPLIED", input.model));
        }

        // 6. Integrity guard
        let integrity = self.guard_integrity(&input, &mut warnings).await?;

        info!(
            model = %input.model,
            samples = live.after,
            severity = %drift.severity,
            progress = warmup.after_pct,
            "daily cycle complete"
        );

        Ok(CycleReport {
            model: input.model,
            cycle_key: key,
            live,
            drift,
            settle,
            warmup,
            promotion,
            integrity,
            warnings,
        })
    }

    /// Step 1: add newly resolved outcomes to the evidence counter, once per
    /// cycle key.
    async fn ingest_live_samples(
        &self,
        input: &CycleInput,
        key: &str,
    ) -> Result<LiveSampleOutcome> {
        let store = self.service.store();
        let current = store
            .get(input.model)
            .await?
            .ok_or(LifecycleError::NotFound(input.model))?;
        let before = current.live.live_samples;

        if input.resolved_outcomes == 0 {
            return Ok(LiveSampleOutcome {
                before,
                after: before,
                delta: 0,
                already_synced: false,
            });
        }

        let already_synced = current
            .live
            .last_sync_at
            .is_some_and(|ts| cycle_key(ts) == key);
        if already_synced {
            return Ok(LiveSampleOutcome {
                before,
                after: before,
                delta: 0,
                already_synced: true,
            });
        }

        let mut next = current.clone();
        next.live.live_samples += input.resolved_outcomes;
        next.live.last_sync_at = Some(input.now);
        next.updated_at = input.now;
        store.update(&next, Some(current.updated_at)).await?;

        Ok(LiveSampleOutcome {
            before,
            after: next.live.live_samples,
            delta: input.resolved_outcomes,
            already_synced: false,
        })
    }

    /// Step 4: advance the probation counter by exactly one day, once per
    /// cycle key, only while warming up.
    async fn advance_warmup(
        &self,
        input: &CycleInput,
        key: &str,
    ) -> Result<WarmupProgressOutcome> {
        let store = self.service.store();
        let current = store
            .get(input.model)
            .await?
            .ok_or(LifecycleError::NotFound(input.model))?;
        let before_pct = current.warmup.progress_pct;

        if current.status != LifecycleStatus::Warmup {
            return Ok(WarmupProgressOutcome {
                status: current.status,
                before_pct,
                after_pct: before_pct,
                advanced: false,
            });
        }

        let already_advanced = current
            .warmup
            .last_run_at
            .is_some_and(|ts| cycle_key(ts) == key);
        if already_advanced {
            return Ok(WarmupProgressOutcome {
                status: current.status,
                before_pct,
                after_pct: before_pct,
                advanced: false,
            });
        }

        let mut next = current.clone();
        next.warmup.resolved_days += 1;
        next.warmup.progress_pct =
            progress_pct(next.warmup.resolved_days, next.warmup.target_days);
        next.warmup.last_run_at = Some(input.now);
        next.updated_at = input.now;
        store.update(&next, Some(current.updated_at)).await?;

        self.service
            .engine()
            .record_event(
                LifecycleEvent::record(
                    input.model,
                    &next.engine_version,
                    EventType::WarmupProgress,
                    Actor::System,
                    input.now,
                )
                .meta("resolved_days", next.warmup.resolved_days)
                .meta("progress_pct", next.warmup.progress_pct),
            )
            .await;

        Ok(WarmupProgressOutcome {
            status: next.status,
            before_pct,
            after_pct: next.warmup.progress_pct,
            advanced: true,
        })
    }

    /// Step 6: repair an inconsistent document; persist and log only when a
    /// fix was needed.
    async fn guard_integrity(
        &self,
        input: &CycleInput,
        warnings: &mut Vec<String>,
    ) -> Result<IntegrityOutcome> {
        let store = self.service.store();
        let current = store
            .get(input.model)
            .await?
            .ok_or(LifecycleError::NotFound(input.model))?;

        let report = self.service.integrity_enforcer().enforce(&current);
        if report.valid {
            return Ok(IntegrityOutcome {
                valid: true,
                fixes: Vec::new(),
            });
        }

        let mut fixed = report.state.clone();
        fixed.updated_at = input.now;
        store.update(&fixed, Some(current.updated_at)).await?;

        self.service
            .engine()
            .record_event(
                LifecycleEvent::record(
                    input.model,
                    &fixed.engine_version,
                    EventType::StateAutofix,
                    Actor::System,
                    input.now,
                )
                .meta("fixes", report.fixes.clone())
                .meta("source", "daily-run"),
            )
            .await;

        warnings.push(format!(
            "state integrity fixed: {}",
            report.fixes.join(", ")
        ));

        Ok(IntegrityOutcome {
            valid: false,
            fixes: report.fixes,
        })
    }
}
