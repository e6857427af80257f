//! The per-model lifecycle state document
//!
//! One live document per `ModelId`. Mutated exclusively through the
//! transition engine, drift monitor, promotion policy, and integrity
//! enforcer; never physically deleted. Revocation and reset are status
//! values, not deletions.

use crate::model::{ModelId, SystemMode};
use crate::status::{DriftSeverity, LifecycleStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Informational engine tag stamped on new documents and events.
pub const DEFAULT_ENGINE_VERSION: &str = "v2.1";

/// Warm-up length used when none is supplied (and the integrity fallback
/// for a zero target).
pub const DEFAULT_WARMUP_TARGET_DAYS: u32 = 30;

/// Minimum resolved live outcomes required for automatic promotion.
pub const MIN_LIVE_SAMPLES: u64 = 30;

/// Warm-up progress: `min(100, round(100 * resolved / target))`.
///
/// A zero target yields 0 rather than dividing; the integrity enforcer
/// repairs the target itself.
pub fn progress_pct(resolved_days: u32, target_days: u32) -> u8 {
    if target_days == 0 {
        return 0;
    }
    let pct = (100.0 * f64::from(resolved_days) / f64::from(target_days)).round();
    pct.min(100.0) as u8
}

/// Warm-up probation progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmupState {
    /// Probation length in resolved days. Always > 0 on a well-formed doc.
    pub target_days: u32,

    /// Days of resolved outcomes accumulated so far.
    pub resolved_days: u32,

    /// Derived percentage, 0..=100. Recomputed on every warm-up write.
    pub progress_pct: u8,

    /// Cycle marker: when the daily run last advanced this warm-up.
    pub last_run_at: Option<DateTime<Utc>>,
}

impl WarmupState {
    /// Fresh probation with the given target and zeroed progress.
    pub fn starting(target_days: u32) -> Self {
        Self {
            target_days,
            resolved_days: 0,
            progress_pct: 0,
            last_run_at: None,
        }
    }
}

impl Default for WarmupState {
    fn default() -> Self {
        Self::starting(DEFAULT_WARMUP_TARGET_DAYS)
    }
}

/// Live outcome evidence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStats {
    /// Resolved live outcome count. Non-decreasing except on explicit reset.
    pub live_samples: u64,

    /// Cycle marker: when the daily run last ingested resolved outcomes.
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Drift observation fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftState {
    pub severity: DriftSeverity,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl Default for DriftState {
    fn default() -> Self {
        Self {
            severity: DriftSeverity::Ok,
            last_checked_at: None,
        }
    }
}

/// One model's lifecycle state document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleState {
    /// Primary key; at most one live document per model.
    pub model_id: ModelId,

    /// Free-form engine tag, informational only.
    pub engine_version: String,

    /// DEV/PROD gate for admin actions.
    pub system_mode: SystemMode,

    /// Current state-machine state.
    pub status: LifecycleStatus,

    /// Warm-up probation progress.
    pub warmup: WarmupState,

    /// Live outcome evidence.
    pub live: LiveStats,

    /// Drift observation fields.
    pub drift: DriftState,

    /// Bound by the external governance subsystem; read-only here.
    pub constitution_hash: Option<String>,

    /// Stamped on every mutation. Doubles as the compare-and-set token
    /// the store uses to serialize writers per model.
    pub updated_at: DateTime<Utc>,
}

impl LifecycleState {
    /// Default document for a model that has never been initialized:
    /// SIMULATION, DEV, zeroed counters.
    pub fn initial(model_id: ModelId, now: DateTime<Utc>) -> Self {
        Self {
            model_id,
            engine_version: DEFAULT_ENGINE_VERSION.to_string(),
            system_mode: SystemMode::Dev,
            status: LifecycleStatus::Simulation,
            warmup: WarmupState::default(),
            live: LiveStats::default(),
            drift: DriftState::default(),
            constitution_hash: None,
            updated_at: now,
        }
    }

    /// Zero every accumulated counter, as the reset transition requires.
    pub fn zero_counters(&mut self) {
        self.warmup = WarmupState::starting(self.warmup.target_days.max(1));
        self.live = LiveStats::default();
        self.drift = DriftState::default();
    }

    /// Whether the governance constitution has been bound to this model.
    pub fn constitution_bound(&self) -> bool {
        self.constitution_hash.is_some()
    }
}
