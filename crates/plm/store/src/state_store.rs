//! Lifecycle state persistence
//!
//! One document per model. Updates go through a compare-and-set on
//! `updated_at`: the caller passes the timestamp it read, and the store
//! rejects the write if the document has moved since. This serializes
//! concurrent writers (request handlers, the daily batch) without an
//! in-process lock.

use crate::error::{Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use plm_types::{LifecycleState, ModelId};

/// Keyed persistence for lifecycle state documents.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Fetch one model's document.
    async fn get(&self, model: ModelId) -> Result<Option<LifecycleState>>;

    /// Insert or overwrite unconditionally. Used for initialization and
    /// integrity repairs applied to a just-read document.
    async fn upsert(&self, state: &LifecycleState) -> Result<()>;

    /// Conditional write: succeeds only if the stored document's
    /// `updated_at` still equals `expected_updated_at` (`None` = document
    /// must not exist yet). Fails with [`StoreError::VersionConflict`]
    /// otherwise.
    async fn update(
        &self,
        state: &LifecycleState,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Snapshot of every model's document.
    async fn list_all(&self) -> Result<Vec<LifecycleState>>;
}

/// In-memory state store for development and tests.
pub struct MemoryStateStore {
    states: DashMap<ModelId, LifecycleState>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self {
            states: DashMap::new(),
        }
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, model: ModelId) -> Result<Option<LifecycleState>> {
        Ok(self.states.get(&model).map(|s| s.clone()))
    }

    async fn upsert(&self, state: &LifecycleState) -> Result<()> {
        self.states.insert(state.model_id, state.clone());
        Ok(())
    }

    async fn update(
        &self,
        state: &LifecycleState,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        // Entry API keeps the check-and-write atomic under the shard lock.
        match self.states.entry(state.model_id) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                let current = occupied.get().updated_at;
                if Some(current) != expected_updated_at {
                    return Err(StoreError::VersionConflict {
                        model: state.model_id,
                        current: current.to_rfc3339(),
                        expected: expected_updated_at
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| "absent".into()),
                    });
                }
                occupied.insert(state.clone());
                Ok(())
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                if let Some(expected) = expected_updated_at {
                    return Err(StoreError::VersionConflict {
                        model: state.model_id,
                        current: "absent".into(),
                        expected: expected.to_rfc3339(),
                    });
                }
                vacant.insert(state.clone());
                Ok(())
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<LifecycleState>> {
        let mut states: Vec<LifecycleState> =
            self.states.iter().map(|s| s.value().clone()).collect();
        states.sort_by_key(|s| s.model_id.as_str());
        Ok(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn upsert_and_get() {
        let store = MemoryStateStore::new();
        let state = LifecycleState::initial(ModelId::Btc, Utc::now());

        store.upsert(&state).await.unwrap();
        let fetched = store.get(ModelId::Btc).await.unwrap().unwrap();
        assert_eq!(fetched, state);
        assert!(store.get(ModelId::Spx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn conditional_update_succeeds_with_matching_token() {
        let store = MemoryStateStore::new();
        let now = Utc::now();
        let state = LifecycleState::initial(ModelId::Btc, now);
        store.upsert(&state).await.unwrap();

        let mut next = state.clone();
        next.live.live_samples = 5;
        next.updated_at = now + Duration::seconds(1);

        store.update(&next, Some(now)).await.unwrap();
        let fetched = store.get(ModelId::Btc).await.unwrap().unwrap();
        assert_eq!(fetched.live.live_samples, 5);
    }

    #[tokio::test]
    async fn stale_token_is_a_version_conflict() {
        let store = MemoryStateStore::new();
        let now = Utc::now();
        let state = LifecycleState::initial(ModelId::Btc, now);
        store.upsert(&state).await.unwrap();

        let stale = now - Duration::seconds(30);
        let mut next = state.clone();
        next.updated_at = Utc::now();

        let err = store.update(&next, Some(stale)).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));
    }

    #[tokio::test]
    async fn create_via_update_requires_absence() {
        let store = MemoryStateStore::new();
        let state = LifecycleState::initial(ModelId::Spx, Utc::now());

        store.update(&state, None).await.unwrap();
        let err = store.update(&state, None).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));
    }

    #[tokio::test]
    async fn list_all_is_ordered_by_model() {
        let store = MemoryStateStore::new();
        let now = Utc::now();
        store
            .upsert(&LifecycleState::initial(ModelId::Spx, now))
            .await
            .unwrap();
        store
            .upsert(&LifecycleState::initial(ModelId::Btc, now))
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].model_id, ModelId::Btc);
        assert_eq!(all[1].model_id, ModelId::Spx);
    }
}
