//! PLM Types - Core types for the model promotion lifecycle
//!
//! PLM (Promotion Lifecycle Manager) governs how predictive models earn and
//! lose production trust: simulated output, warm-up probation, live-applied
//! serving, and revocation.
//!
//! ## Architectural Boundaries
//!
//! - **PLM** owns: the lifecycle state machine, promotion policy, drift-driven
//!   revocation, state integrity, combined readiness
//! - **Daily-run orchestrator** owns: sample resolution and drift-score
//!   computation (PLM only consumes their outputs)
//! - **Governance** owns: the constitution hash bound into the state
//!
//! ## Key Concepts
//!
//! - **LifecycleState**: one persisted document per tracked model
//! - **LifecycleStatus**: the state machine's six states
//! - **TransitionAction**: every way a status may change, admin or system
//! - **DriftSeverity**: ordered escalation ladder feeding auto-revocation
//! - **CombinedReadiness**: cross-model production-readiness signal

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod action;
pub mod event;
pub mod model;
pub mod readiness;
pub mod state;
pub mod status;

// Re-export main types
pub use action::{Actor, TransitionAction};
pub use event::EventType;
pub use model::{ModelId, SystemMode, UnknownModelError};
pub use readiness::CombinedReadiness;
pub use state::{
    progress_pct, DriftState, LifecycleState, LiveStats, WarmupState, DEFAULT_ENGINE_VERSION,
    DEFAULT_WARMUP_TARGET_DAYS, MIN_LIVE_SAMPLES,
};
pub use status::{DriftSeverity, LifecycleStatus, UnknownStatusError};
