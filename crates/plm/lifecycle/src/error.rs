//! Lifecycle error types

use plm_store::StoreError;
use plm_types::{LifecycleStatus, ModelId, UnknownModelError, UnknownStatusError};
use thiserror::Error;

/// Lifecycle core errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// No state document exists for the requested model.
    #[error("model {0} not found in lifecycle")]
    NotFound(ModelId),

    /// A transition guard failed; nothing was written.
    #[error("cannot {action} while {from}: {reason}")]
    InvalidTransition {
        from: LifecycleStatus,
        action: String,
        reason: String,
    },

    /// Malformed input: unknown model tag, malformed status override.
    #[error("validation error: {0}")]
    Validation(String),

    /// Persistence failure, propagated unretried.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<UnknownModelError> for LifecycleError {
    fn from(err: UnknownModelError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<UnknownStatusError> for LifecycleError {
    fn from(err: UnknownStatusError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;
