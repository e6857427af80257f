//! Transition actions
//!
//! Every way a model's status may change, admin-initiated or system-driven.
//! Guard logic in the engine matches exhaustively on `(status, action)`.

use crate::event::EventType;
use crate::model::SystemMode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who initiated an action or event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Actor {
    System,
    Admin,
}

impl Actor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "SYSTEM",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionAction {
    /// Flag a simulated model as a promotion candidate.
    Propose,

    /// Begin warm-up probation with the given target length.
    StartWarmup { target_days: u32 },

    /// Admin override: restart warm-up from any non-warm-up status.
    ForceWarmup { target_days: u32 },

    /// System-only: promote a warmed-up model on sufficient evidence.
    AutoPromote,

    /// Admin override: apply without the evidence bar.
    ForceApply,

    /// System-only: revoke on critical drift escalation.
    DriftRevoke,

    /// Admin override: revoke production trust.
    ForceRevoke,

    /// Return to SIMULATION with zeroed counters. Dev mode only.
    Reset,
}

impl TransitionAction {
    /// Short name used in failure reasons and event metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Propose => "propose",
            Self::StartWarmup { .. } => "start-warmup",
            Self::ForceWarmup { .. } => "force-warmup",
            Self::AutoPromote => "auto-promote",
            Self::ForceApply => "force-apply",
            Self::DriftRevoke => "drift-critical",
            Self::ForceRevoke => "force-revoke",
            Self::Reset => "reset",
        }
    }

    /// Event type recorded when this action is accepted.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Propose => EventType::StatusChanged,
            Self::StartWarmup { .. } => EventType::WarmupStart,
            Self::ForceWarmup { .. } => EventType::ForceWarmup,
            Self::AutoPromote => EventType::AutoApply,
            Self::ForceApply => EventType::ForceApply,
            Self::DriftRevoke => EventType::DriftCritical,
            Self::ForceRevoke => EventType::Revoke,
            Self::Reset => EventType::ResetSimulation,
        }
    }

    /// System-internal actions may not be requested through the admin path.
    pub fn is_system_only(&self) -> bool {
        matches!(self, Self::AutoPromote | Self::DriftRevoke)
    }

    /// Whether this action is permitted under the given system mode.
    pub fn allowed_in(&self, mode: SystemMode) -> bool {
        match self {
            Self::Reset => mode.is_dev(),
            _ => true,
        }
    }
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
