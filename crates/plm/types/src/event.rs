//! Lifecycle event types
//!
//! Every audit-trail entry carries one of these closed variants. The event
//! document itself (with its hash chain) lives in `plm-store`, next to the
//! log that finalizes it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Initial state document created.
    Generated,
    /// Warm-up probation started.
    WarmupStart,
    /// Daily warm-up advance.
    WarmupProgress,
    /// Automatic promotion to APPLIED.
    AutoApply,
    /// Admin force-apply to APPLIED_MANUAL.
    ForceApply,
    /// Admin-forced warm-up restart.
    ForceWarmup,
    /// Revocation of production trust.
    Revoke,
    /// Reset back to SIMULATION.
    ResetSimulation,
    /// Drift escalated to WARN; observability only.
    DriftWarn,
    /// Drift escalated to CRITICAL; auto-revocation.
    DriftCritical,
    /// Integrity enforcer corrected an inconsistent document.
    StateAutofix,
    /// Dev truth mode enabled.
    DevTruthMode,
    /// Generic status change (propose and similar).
    StatusChanged,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generated => "GENERATED",
            Self::WarmupStart => "WARMUP_START",
            Self::WarmupProgress => "WARMUP_PROGRESS",
            Self::AutoApply => "AUTO_APPLY",
            Self::ForceApply => "FORCE_APPLY",
            Self::ForceWarmup => "FORCE_WARMUP",
            Self::Revoke => "REVOKE",
            Self::ResetSimulation => "RESET_SIMULATION",
            Self::DriftWarn => "DRIFT_WARN",
            Self::DriftCritical => "DRIFT_CRITICAL",
            Self::StateAutofix => "STATE_AUTOFIX",
            Self::DevTruthMode => "DEV_TRUTH_MODE",
            Self::StatusChanged => "STATUS_CHANGED",
        }
    }

    /// Revoke-class events remove production trust.
    pub fn is_revocation(&self) -> bool {
        matches!(self, Self::Revoke | Self::DriftCritical)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
