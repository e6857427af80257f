//! Model identifiers and system modes
//!
//! The set of tracked models is fixed and small; everything downstream keys
//! off `ModelId`, so it is a closed enum rather than a free-form string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A tracked predictive model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelId {
    /// Bitcoin forecast model
    Btc,
    /// S&P 500 forecast model
    Spx,
}

impl ModelId {
    /// Every tracked model, in canonical order.
    pub const ALL: [ModelId; 2] = [ModelId::Btc, ModelId::Spx];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Btc => "BTC",
            Self::Spx => "SPX",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for model tags outside the tracked set.
#[derive(Debug, Clone, Error)]
#[error("unknown model id: {0}")]
pub struct UnknownModelError(pub String);

impl FromStr for ModelId {
    type Err = UnknownModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BTC" => Ok(Self::Btc),
            "SPX" => Ok(Self::Spx),
            other => Err(UnknownModelError(other.to_string())),
        }
    }
}

/// Operating mode of a model's lifecycle document.
///
/// Orthogonal to status: an applied model may still run in Dev. The mode
/// gates which admin actions are permitted, not what the model serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SystemMode {
    Dev,
    Prod,
}

impl SystemMode {
    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "DEV",
            Self::Prod => "PROD",
        }
    }
}

impl fmt::Display for SystemMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
