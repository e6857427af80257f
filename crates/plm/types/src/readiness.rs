//! Combined cross-model readiness
//!
//! Derived fresh from the current snapshot of all lifecycle states;
//! never persisted, never cached.

use serde::{Deserialize, Serialize};

/// Whether the cross-model composite mode may activate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedReadiness {
    /// True only when every tracked model is independently production-ready.
    pub ready: bool,

    /// Specific blocking conditions, one per unmet requirement.
    pub blockers: Vec<String>,

    /// Proposed next corrective action, when one is obvious.
    pub suggested_action: Option<String>,
}

impl CombinedReadiness {
    /// The all-clear signal.
    pub fn ready() -> Self {
        Self {
            ready: true,
            blockers: Vec::new(),
            suggested_action: None,
        }
    }

    /// A blocked signal with the given blockers and optional suggestion.
    pub fn blocked(blockers: Vec<String>, suggested_action: Option<String>) -> Self {
        Self {
            ready: false,
            blockers,
            suggested_action,
        }
    }
}
