//! Automatic promotion policy
//!
//! A warmed-up model earns APPLIED only when every evidence condition holds
//! simultaneously: probation complete, drift clean, and enough resolved live
//! outcomes. The evaluation is pure; only an actual promotion writes.

use crate::engine::TransitionEngine;
use crate::error::{LifecycleError, Result};
use chrono::{DateTime, Utc};
use plm_store::StateStore;
use plm_types::{
    Actor, DriftSeverity, LifecycleState, LifecycleStatus, ModelId, TransitionAction,
    MIN_LIVE_SAMPLES,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// One promotion precondition, with what was observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionCheck {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

/// Dry-run eligibility report for one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionReport {
    pub model_id: ModelId,
    pub eligible: bool,
    pub checks: Vec<PromotionCheck>,
}

impl PromotionReport {
    /// First failing condition, if any.
    pub fn first_failure(&self) -> Option<&PromotionCheck> {
        self.checks.iter().find(|c| !c.passed)
    }
}

/// Outcome of a check-and-promote attempt.
#[derive(Debug, Clone)]
pub enum PromotionOutcome {
    /// Transition applied; the model is now APPLIED.
    Promoted { state: LifecycleState },

    /// In warm-up but evidence insufficient; names the unmet condition.
    Blocked { reason: String },

    /// Wrong starting status; promotion does not apply.
    NotEligible { reason: String },
}

impl PromotionOutcome {
    pub fn promoted(&self) -> bool {
        matches!(self, Self::Promoted { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Promoted { .. } => None,
            Self::Blocked { reason } | Self::NotEligible { reason } => Some(reason),
        }
    }
}

/// Evaluates and applies automatic promotion.
pub struct PromotionPolicy {
    store: Arc<dyn StateStore>,
    engine: Arc<TransitionEngine>,
    min_live_samples: u64,
}

impl PromotionPolicy {
    pub fn new(store: Arc<dyn StateStore>, engine: Arc<TransitionEngine>) -> Self {
        Self {
            store,
            engine,
            min_live_samples: MIN_LIVE_SAMPLES,
        }
    }

    /// Pure evaluation of every promotion precondition.
    pub fn evaluate(&self, state: &LifecycleState) -> PromotionReport {
        let checks = vec![
            PromotionCheck {
                name: "status".into(),
                passed: state.status == LifecycleStatus::Warmup,
                detail: format!("status is {}", state.status),
            },
            PromotionCheck {
                name: "warmup-complete".into(),
                passed: state.warmup.progress_pct == 100,
                detail: format!(
                    "warm-up at {}% ({}/{} days)",
                    state.warmup.progress_pct,
                    state.warmup.resolved_days,
                    state.warmup.target_days
                ),
            },
            PromotionCheck {
                name: "drift-clean".into(),
                passed: state.drift.severity == DriftSeverity::Ok,
                detail: format!("drift severity is {}", state.drift.severity),
            },
            PromotionCheck {
                name: "live-evidence".into(),
                passed: state.live.live_samples >= self.min_live_samples,
                detail: format!(
                    "{} of {} required live samples",
                    state.live.live_samples, self.min_live_samples
                ),
            },
        ];

        PromotionReport {
            model_id: state.model_id,
            eligible: checks.iter().all(|c| c.passed),
            checks,
        }
    }

    /// Dry-run report for the model's current document.
    pub async fn validate(&self, model: ModelId) -> Result<PromotionReport> {
        let state = self
            .store
            .get(model)
            .await?
            .ok_or(LifecycleError::NotFound(model))?;
        Ok(self.evaluate(&state))
    }

    /// Promote if and only if every condition holds.
    #[instrument(skip(self), fields(model = %model))]
    pub async fn check_and_promote(
        &self,
        model: ModelId,
        now: DateTime<Utc>,
    ) -> Result<PromotionOutcome> {
        let state = self
            .store
            .get(model)
            .await?
            .ok_or(LifecycleError::NotFound(model))?;

        if state.status != LifecycleStatus::Warmup {
            return Ok(PromotionOutcome::NotEligible {
                reason: format!("status is {}, not WARMUP", state.status),
            });
        }

        let report = self.evaluate(&state);
        if let Some(failed) = report.first_failure() {
            return Ok(PromotionOutcome::Blocked {
                reason: failed.detail.clone(),
            });
        }

        let outcome = self
            .engine
            .apply(
                model,
                TransitionAction::AutoPromote,
                Actor::System,
                Some("warm-up complete with sufficient evidence"),
                now,
            )
            .await?;

        info!(model = %model, "model auto-promoted to APPLIED");
        Ok(PromotionOutcome::Promoted {
            state: outcome.state,
        })
    }
}
