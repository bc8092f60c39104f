//! JSON-file-backed draft state store.
//!
//! The whole mapping lives in one JSON document keyed by beamtime id. Every
//! upsert rewrites the file through a temp file in the same directory
//! followed by an atomic rename, so a crash mid-write never leaves a
//! half-updated file visible to the next tick.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use beamdoi_core::{BeamtimeId, Error, Result};

use crate::state::DraftState;
use crate::store::{checked_insert, DraftStateStore};

/// File-backed draft state store.
#[derive(Debug)]
pub struct JsonFileDraftStore {
    path: PathBuf,
    // Mutex rather than RwLock: every write rewrites the file, and reads
    // are served from the cached map under the same lock.
    states: Mutex<HashMap<BeamtimeId, DraftState>>,
}

impl JsonFileDraftStore {
    /// Open the store, loading any existing state file.
    ///
    /// # Errors
    ///
    /// Returns a store error if the file exists but cannot be parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let states = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str::<HashMap<BeamtimeId, DraftState>>(&raw)
                .map_err(|e| Error::store(format!("corrupt state file {}: {e}", path.display())))?
        } else {
            HashMap::new()
        };
        debug!(path = %path.display(), records = states.len(), "Opened draft state store");
        Ok(Self {
            path,
            states: Mutex::new(states),
        })
    }

    fn persist(path: &Path, states: &HashMap<BeamtimeId, DraftState>) -> Result<()> {
        // BTreeMap keeps the file diffable across rewrites.
        let ordered: BTreeMap<_, _> = states.iter().collect();
        let encoded = serde_json::to_vec_pretty(&ordered)
            .map_err(|e| Error::store(format!("failed to encode state: {e}")))?;

        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new_in(".")?,
        };
        std::fs::write(tmp.path(), &encoded)?;
        tmp.persist(path)
            .map_err(|e| Error::store(format!("failed to replace state file: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl DraftStateStore for JsonFileDraftStore {
    async fn get(&self, id: &BeamtimeId) -> Result<Option<DraftState>> {
        let states = self.states.lock().await;
        Ok(states.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<DraftState>> {
        let states = self.states.lock().await;
        Ok(states.values().cloned().collect())
    }

    async fn upsert(&self, state: DraftState) -> Result<DraftState> {
        let mut states = self.states.lock().await;
        let stored = checked_insert(&mut states, state)?;
        Self::persist(&self.path, &states)?;
        Ok(stored)
    }

    async fn remove(&self, id: &BeamtimeId) -> Result<bool> {
        let mut states = self.states.lock().await;
        let existed = states.remove(id).is_some();
        if existed {
            Self::persist(&self.path, &states)?;
        }
        Ok(existed)
    }
}
