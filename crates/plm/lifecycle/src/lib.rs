//! PLM Lifecycle - The promotion state machine and its policies
//!
//! This crate owns every way a model's lifecycle document may change:
//!
//! - [`TransitionEngine`] validates and applies status transitions against an
//!   exhaustive guard table, records before/after, and appends audit events.
//! - [`PromotionPolicy`] decides when a warmed-up model has earned automatic
//!   promotion.
//! - [`DriftMonitor`] folds freshly computed drift severity into the state
//!   and triggers auto-revocation on critical escalation.
//! - [`IntegrityEnforcer`] is a pure repair function restoring documents to a
//!   state the machine could have produced.
//! - [`CombinedReadinessEvaluator`] derives the cross-model readiness signal.
//! - [`LifecycleService`] composes the above behind one injected-dependency
//!   facade; there is no process-wide singleton.

#![deny(unsafe_code)]

pub mod drift;
pub mod engine;
pub mod error;
pub mod integrity;
pub mod promotion;
pub mod readiness;
pub mod service;

pub use drift::{DriftMonitor, DriftOutcome};
pub use engine::{TransitionEngine, TransitionOutcome};
pub use error::{LifecycleError, Result};
pub use integrity::{IntegrityEnforcer, IntegrityReport};
pub use promotion::{PromotionCheck, PromotionOutcome, PromotionPolicy, PromotionReport};
pub use readiness::CombinedReadinessEvaluator;
pub use service::{LifecycleService, ModelDiagnostics};
