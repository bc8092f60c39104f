//! Draft state store trait and the in-memory backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use beamdoi_core::{BeamtimeId, Error, Result};

use crate::state::DraftState;

/// Durable mapping of beamtime id to last known reconciliation state.
#[async_trait]
pub trait DraftStateStore: Send + Sync {
    /// Load the state for one record.
    async fn get(&self, id: &BeamtimeId) -> Result<Option<DraftState>>;

    /// Load all tracked states.
    async fn list(&self) -> Result<Vec<DraftState>>;

    /// Atomically write one record's state.
    ///
    /// Compare-and-swap semantics: `state.generation` must equal the stored
    /// generation (0 for a record not yet stored). On success the stored
    /// generation is bumped and the persisted state returned; on mismatch a
    /// conflict error tells the caller to re-read and recompute.
    async fn upsert(&self, state: DraftState) -> Result<DraftState>;

    /// Remove a record's state entirely. Returns whether it existed.
    async fn remove(&self, id: &BeamtimeId) -> Result<bool>;
}

pub(crate) fn checked_insert(
    map: &mut HashMap<BeamtimeId, DraftState>,
    mut state: DraftState,
) -> Result<DraftState> {
    let current_generation = map.get(&state.id).map_or(0, |s| s.generation);
    if state.generation != current_generation {
        return Err(Error::conflict(state.id.as_str()));
    }
    state.generation = state.generation.saturating_add(1);
    map.insert(state.id.clone(), state.clone());
    Ok(state)
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct InMemoryDraftStore {
    states: RwLock<HashMap<BeamtimeId, DraftState>>,
}

impl InMemoryDraftStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftStateStore for InMemoryDraftStore {
    async fn get(&self, id: &BeamtimeId) -> Result<Option<DraftState>> {
        let states = self.states.read().await;
        Ok(states.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<DraftState>> {
        let states = self.states.read().await;
        Ok(states.values().cloned().collect())
    }

    async fn upsert(&self, state: DraftState) -> Result<DraftState> {
        let mut states = self.states.write().await;
        checked_insert(&mut states, state)
    }

    async fn remove(&self, id: &BeamtimeId) -> Result<bool> {
        let mut states = self.states.write().await;
        Ok(states.remove(id).is_some())
    }
}
