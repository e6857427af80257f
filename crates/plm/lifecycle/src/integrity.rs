//! State integrity enforcement
//!
//! A pure, deterministic repair pass over one document. Concurrent or
//! partial writers can leave a document internally inconsistent; this
//! restores it to something the state machine could have produced and
//! reports every fix as an explicit diff. It never makes business
//! decisions. Persisting the correction (and logging the autofix event)
//! is the caller's job, and only when the document was actually invalid.

use plm_types::{
    progress_pct, LifecycleState, LifecycleStatus, DEFAULT_WARMUP_TARGET_DAYS, MIN_LIVE_SAMPLES,
};

/// Result of an integrity pass.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    /// True when the document needed no repair.
    pub valid: bool,

    /// The corrected document (identical to the input when valid).
    pub state: LifecycleState,

    /// Human-readable description of every fix applied.
    pub fixes: Vec<String>,
}

/// Pure repair function over lifecycle state documents.
#[derive(Debug, Default)]
pub struct IntegrityEnforcer;

impl IntegrityEnforcer {
    pub fn new() -> Self {
        Self
    }

    /// Detect and correct internal inconsistencies.
    pub fn enforce(&self, state: &LifecycleState) -> IntegrityReport {
        let mut fixed = state.clone();
        let mut fixes = Vec::new();

        if fixed.warmup.target_days == 0 {
            fixes.push(format!(
                "warmup.target_days was 0; restored default {DEFAULT_WARMUP_TARGET_DAYS}"
            ));
            fixed.warmup.target_days = DEFAULT_WARMUP_TARGET_DAYS;
        }

        if fixed.warmup.resolved_days > fixed.warmup.target_days {
            fixes.push(format!(
                "warmup.resolved_days {} exceeded target {}; clamped",
                fixed.warmup.resolved_days, fixed.warmup.target_days
            ));
            fixed.warmup.resolved_days = fixed.warmup.target_days;
        }

        let expected_pct = progress_pct(fixed.warmup.resolved_days, fixed.warmup.target_days);
        if fixed.warmup.progress_pct != expected_pct {
            fixes.push(format!(
                "warmup.progress_pct {} did not match {}/{} days; recomputed to {}",
                fixed.warmup.progress_pct,
                fixed.warmup.resolved_days,
                fixed.warmup.target_days,
                expected_pct
            ));
            fixed.warmup.progress_pct = expected_pct;
        }

        // APPLIED is only reachable through the evidence-backed promotion
        // path; without the evidence, the manual path is the only state the
        // machine could have produced.
        if fixed.status == LifecycleStatus::Applied && fixed.live.live_samples < MIN_LIVE_SAMPLES {
            fixes.push(format!(
                "status APPLIED with only {} live samples (minimum {}); reclassified as APPLIED_MANUAL",
                fixed.live.live_samples, MIN_LIVE_SAMPLES
            ));
            fixed.status = LifecycleStatus::AppliedManual;
        }

        IntegrityReport {
            valid: fixes.is_empty(),
            state: fixed,
            fixes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use plm_types::ModelId;

    fn enforcer() -> IntegrityEnforcer {
        IntegrityEnforcer::new()
    }

    fn base() -> LifecycleState {
        LifecycleState::initial(ModelId::Btc, Utc::now())
    }

    #[test]
    fn well_formed_document_passes_untouched() {
        let mut state = base();
        state.status = LifecycleStatus::Warmup;
        state.warmup.target_days = 30;
        state.warmup.resolved_days = 15;
        state.warmup.progress_pct = 50;

        let report = enforcer().enforce(&state);
        assert!(report.valid);
        assert!(report.fixes.is_empty());
        assert_eq!(report.state, state);
    }

    #[test]
    fn overflowed_progress_is_clamped() {
        let mut state = base();
        state.status = LifecycleStatus::Warmup;
        state.warmup.target_days = 30;
        state.warmup.resolved_days = 30;
        state.warmup.progress_pct = 150;

        let report = enforcer().enforce(&state);
        assert!(!report.valid);
        assert_eq!(report.state.warmup.progress_pct, 100);
        assert_eq!(report.fixes.len(), 1);
        assert!(report.fixes[0].contains("150"));
    }

    #[test]
    fn zero_target_restored_to_default() {
        let mut state = base();
        state.warmup.target_days = 0;
        state.warmup.resolved_days = 5;
        state.warmup.progress_pct = 0;

        let report = enforcer().enforce(&state);
        assert!(!report.valid);
        assert_eq!(report.state.warmup.target_days, 30);
        assert_eq!(report.state.warmup.progress_pct, 17);
    }

    #[test]
    fn resolved_days_clamped_to_target() {
        let mut state = base();
        state.status = LifecycleStatus::Warmup;
        state.warmup.target_days = 30;
        state.warmup.resolved_days = 45;
        state.warmup.progress_pct = 100;

        let report = enforcer().enforce(&state);
        assert!(!report.valid);
        assert_eq!(report.state.warmup.resolved_days, 30);
        assert_eq!(report.state.warmup.progress_pct, 100);
    }

    #[test]
    fn applied_without_evidence_reclassified_as_manual() {
        let mut state = base();
        state.status = LifecycleStatus::Applied;
        state.warmup.resolved_days = 30;
        state.warmup.progress_pct = 100;
        state.live.live_samples = 3;

        let report = enforcer().enforce(&state);
        assert!(!report.valid);
        assert_eq!(report.state.status, LifecycleStatus::AppliedManual);
    }

    #[test]
    fn applied_with_evidence_is_left_alone() {
        let mut state = base();
        state.status = LifecycleStatus::Applied;
        state.warmup.resolved_days = 30;
        state.warmup.progress_pct = 100;
        state.live.live_samples = 42;

        let report = enforcer().enforce(&state);
        assert!(report.valid);
    }

    #[test]
    fn enforcement_is_deterministic_and_idempotent() {
        let mut state = base();
        state.status = LifecycleStatus::Applied;
        state.warmup.target_days = 0;
        state.warmup.progress_pct = 150;
        state.live.live_samples = 0;

        let first = enforcer().enforce(&state);
        assert!(!first.valid);

        let second = enforcer().enforce(&first.state);
        assert!(second.valid, "repaired document must pass: {:?}", second.fixes);
        assert_eq!(second.state, first.state);
    }
}
