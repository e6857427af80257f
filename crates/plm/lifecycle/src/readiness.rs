//! Combined cross-model readiness
//!
//! The composite mode may only activate when every tracked model is
//! independently production-ready: applied status and PROD mode. Computed
//! fresh from the store on every call; never cached.

use crate::error::Result;
use plm_store::StateStore;
use plm_types::{CombinedReadiness, ModelId, SystemMode};
use std::sync::Arc;

/// Derives the cross-model readiness signal from the current snapshot.
pub struct CombinedReadinessEvaluator {
    store: Arc<dyn StateStore>,
}

impl CombinedReadinessEvaluator {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub async fn evaluate(&self) -> Result<CombinedReadiness> {
        let states = self.store.list_all().await?;

        let mut blockers = Vec::new();
        let mut suggested: Option<String> = None;

        for model in ModelId::ALL {
            let Some(state) = states.iter().find(|s| s.model_id == model) else {
                blockers.push(format!("{model} has no lifecycle state"));
                suggested.get_or_insert_with(|| "initialize lifecycle states".to_string());
                continue;
            };

            if !state.status.is_applied() {
                blockers.push(format!("{model} not applied (status {})", state.status));
                suggested.get_or_insert_with(|| format!("force-apply {model}"));
            }
            if state.system_mode != SystemMode::Prod {
                blockers.push(format!("{model} running in DEV mode"));
                suggested.get_or_insert_with(|| format!("switch {model} to PROD"));
            }
        }

        if blockers.is_empty() {
            Ok(CombinedReadiness::ready())
        } else {
            Ok(CombinedReadiness::blocked(blockers, suggested))
        }
    }
}
