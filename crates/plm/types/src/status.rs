//! Lifecycle status and drift severity enums
//!
//! Both are closed tagged variants so transition and guard logic can match
//! exhaustively; a new state cannot be added without updating every consumer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The state machine's current state for one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    /// Output is simulated only; nothing is served. Initial state.
    Simulation,
    /// Flagged by an admin as a promotion candidate.
    Proposed,
    /// Probation: accumulating resolved-outcome evidence toward promotion.
    Warmup,
    /// Production-serving, earned through the automatic promotion policy.
    Applied,
    /// Production-serving by admin override, without the evidence bar.
    AppliedManual,
    /// Production trust removed; requires an explicit reset to leave.
    Revoked,
}

impl LifecycleStatus {
    /// Whether this status serves production output.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied | Self::AppliedManual)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simulation => "SIMULATION",
            Self::Proposed => "PROPOSED",
            Self::Warmup => "WARMUP",
            Self::Applied => "APPLIED",
            Self::AppliedManual => "APPLIED_MANUAL",
            Self::Revoked => "REVOKED",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for status tags outside the fixed set.
#[derive(Debug, Clone, Error)]
#[error("unknown lifecycle status: {0}")]
pub struct UnknownStatusError(pub String);

impl FromStr for LifecycleStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SIMULATION" => Ok(Self::Simulation),
            "PROPOSED" => Ok(Self::Proposed),
            "WARMUP" => Ok(Self::Warmup),
            "APPLIED" => Ok(Self::Applied),
            "APPLIED_MANUAL" => Ok(Self::AppliedManual),
            "REVOKED" => Ok(Self::Revoked),
            other => Err(UnknownStatusError(other.to_string())),
        }
    }
}

/// Drift severity, ordered by escalation.
///
/// `Ord` follows declaration order, so `severity >= DriftSeverity::Warn`
/// reads as "at least WARN".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum DriftSeverity {
    Ok,
    Watch,
    Warn,
    Critical,
}

impl DriftSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Watch => "WATCH",
            Self::Warn => "WARN",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for DriftSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
