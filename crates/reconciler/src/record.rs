//! Beamtime records and the data-source boundary.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use beamdoi_core::{BeamtimeId, Error, Intent, Result};
use beamdoi_datacite::DoiMetadata;

/// One beamtime dataset as supplied by the external data source.
///
/// The engine only reads these; the data source owns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamtimeRecord {
    pub id: BeamtimeId,
    pub intent: Intent,
    pub metadata: DoiMetadata,
}

/// Read boundary to the beamtime data source.
///
/// Returns the full current snapshot; the source is assumed eventually
/// consistent and is polled once per tick.
#[async_trait]
pub trait BeamtimeSource: Send + Sync {
    /// Fetch the current set of beamtime records.
    ///
    /// # Errors
    ///
    /// Any failure here is a fetch error and aborts the current tick.
    async fn snapshot(&self) -> Result<Vec<BeamtimeRecord>>;
}

/// Snapshot file exported by the beamline database.
pub struct JsonBeamtimeSource {
    path: PathBuf,
}

impl JsonBeamtimeSource {
    /// Create a source reading the given snapshot file each tick.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BeamtimeSource for JsonBeamtimeSource {
    async fn snapshot(&self) -> Result<Vec<BeamtimeRecord>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::fetch(format!("cannot read {}: {e}", self.path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::fetch(format!("malformed snapshot {}: {e}", self.path.display())))
    }
}

/// Fixed snapshot source for tests; the contents can be swapped between
/// ticks to simulate metadata edits and intent flips.
#[derive(Default)]
pub struct StaticSource {
    records: Mutex<Vec<BeamtimeRecord>>,
}

impl StaticSource {
    /// Create a source serving the given records.
    #[must_use]
    pub fn new(records: Vec<BeamtimeRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Replace the snapshot served to the next tick.
    pub async fn set(&self, records: Vec<BeamtimeRecord>) {
        *self.records.lock().await = records;
    }
}

#[async_trait]
impl BeamtimeSource for StaticSource {
    async fn snapshot(&self) -> Result<Vec<BeamtimeRecord>> {
        Ok(self.records.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn record(id: &str) -> BeamtimeRecord {
        BeamtimeRecord {
            id: BeamtimeId::new(id),
            intent: Intent::Active,
            metadata: DoiMetadata::new("Test beamtime", Vec::new(), "UChicago", 2025),
        }
    }

    #[tokio::test]
    async fn json_source_reads_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beamtimes.json");
        let records = vec![record("bt-1"), record("bt-2")];
        std::fs::write(&path, serde_json::to_vec(&records).unwrap()).unwrap();

        let source = JsonBeamtimeSource::new(&path);
        let snapshot = source.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id.as_str(), "bt-1");
    }

    #[tokio::test]
    async fn missing_snapshot_is_fetch_error() {
        let source = JsonBeamtimeSource::new("/nonexistent/beamtimes.json");
        let err = source.snapshot().await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[tokio::test]
    async fn malformed_snapshot_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beamtimes.json");
        std::fs::write(&path, "{broken").unwrap();

        let err = JsonBeamtimeSource::new(&path).snapshot().await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[tokio::test]
    async fn static_source_swaps_snapshots() {
        let source = StaticSource::new(vec![record("bt-1")]);
        assert_eq!(source.snapshot().await.unwrap().len(), 1);

        source.set(vec![record("bt-1"), record("bt-2")]).await;
        assert_eq!(source.snapshot().await.unwrap().len(), 2);
    }
}
