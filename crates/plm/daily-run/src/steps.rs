//! Typed step outcomes for the daily cycle
//!
//! Each step reads the document fresh, acts, and reports what it observed.
//! The outcomes chain explicitly through the runner; there is no shared
//! mutable context object.

use chrono::{DateTime, Utc};
use plm_types::{DriftSeverity, LifecycleStatus};
use serde::{Deserialize, Serialize};

/// Cycle key: one ingest and one warm-up advance per model per UTC day.
pub fn cycle_key(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Step 1: live-sample ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSampleOutcome {
    pub before: u64,
    pub after: u64,
    pub delta: u64,

    /// True when the cycle key showed this ingest already ran today.
    pub already_synced: bool,
}

/// Step 2: drift check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftCheckOutcome {
    pub severity: DriftSeverity,
    pub previous: DriftSeverity,
    pub revoked: bool,
}

/// Step 3: settlement diff of whatever the earlier steps changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookSettleOutcome {
    pub status_before: LifecycleStatus,
    pub status_after: LifecycleStatus,

    /// "FROM -> TO" when a transition occurred during this cycle.
    pub transition: Option<String>,
}

/// Step 4: warm-up advance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmupProgressOutcome {
    pub status: LifecycleStatus,
    pub before_pct: u8,
    pub after_pct: u8,

    /// True when this cycle advanced `resolved_days`.
    pub advanced: bool,
}

/// Step 6: integrity guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityOutcome {
    pub valid: bool,
    pub fixes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cycle_key_is_the_utc_date() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 59).unwrap();
        assert_eq!(cycle_key(ts), "2025-03-09");

        let next_day = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 1).unwrap();
        assert_ne!(cycle_key(ts), cycle_key(next_day));
    }

    #[test]
    fn same_day_shares_a_key() {
        let morning = Utc.with_ymd_and_hms(2025, 3, 9, 6, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2025, 3, 9, 21, 30, 0).unwrap();
        assert_eq!(cycle_key(morning), cycle_key(evening));
    }
}
