//! End-to-end reconciliation flow over the public crate APIs.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use beamdoi_core::{BeamtimeId, Intent, LifecycleState, Result, SchedulerConfig};
use beamdoi_datacite::{Creator, DoiMetadata, RegistrationClient};
use beamdoi_reconciler::{BeamtimeRecord, JsonBeamtimeSource, Scheduler, StaticSource};
use beamdoi_store::{DraftStateStore, InMemoryDraftStore, JsonFileDraftStore};

/// Registration client that always succeeds and hands out sequential ids.
#[derive(Default)]
struct FakeRegistry {
    created: AtomicUsize,
}

#[async_trait]
impl RegistrationClient for FakeRegistry {
    async fn create(&self, _id: &BeamtimeId, _metadata: &DoiMetadata) -> Result<String> {
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("10.x/abc{n}"))
    }

    async fn update(&self, _doi_id: &str, _metadata: &DoiMetadata) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _doi_id: &str) -> Result<()> {
        Ok(())
    }

    async fn fetch(&self, doi_id: &str) -> Result<DoiMetadata> {
        Err(beamdoi_core::Error::not_found(doi_id.to_string()))
    }
}

fn beamtime(id: &str, intent: Intent, year: i32) -> BeamtimeRecord {
    let creator = Creator::person("Ada", "Lovelace").with_orcid("0000-0001-2345-6789");
    BeamtimeRecord {
        id: BeamtimeId::new(id),
        intent,
        metadata: DoiMetadata::new(
            "In situ diffraction study",
            vec![creator],
            "University of Chicago",
            year,
        ),
    }
}

fn config() -> SchedulerConfig {
    SchedulerConfig {
        audit_every_ticks: 0,
        ..SchedulerConfig::default()
    }
}

#[tokio::test]
async fn full_lifecycle_create_update_delete() {
    let record = beamtime("bt-1", Intent::Active, 2025);
    let source = Arc::new(StaticSource::new(vec![record.clone()]));
    let store = Arc::new(InMemoryDraftStore::new());
    let scheduler = Scheduler::new(
        source.clone(),
        Arc::new(FakeRegistry::default()),
        store.clone(),
        config(),
    );

    // Tick 1: active record with no state issues a create.
    let report = scheduler.run_once().await.unwrap();
    assert_eq!(report.created, 1);

    let h1 = record.metadata.content_hash();
    let state = store.get(&record.id).await.unwrap().unwrap();
    assert_eq!(state.remote_doi_id.as_deref(), Some("10.x/abc0"));
    assert_eq!(state.lifecycle, LifecycleState::Draft);
    assert_eq!(state.last_applied_hash, Some(h1.clone()));

    // Tick 2: metadata unchanged, nothing happens.
    let report = scheduler.run_once().await.unwrap();
    assert_eq!(report.unchanged, 1);

    // Tick 3: metadata changed, update moves the applied hash.
    let changed = beamtime("bt-1", Intent::Active, 2026);
    let h2 = changed.metadata.content_hash();
    assert_ne!(h1, h2);
    source.set(vec![changed]).await;

    let report = scheduler.run_once().await.unwrap();
    assert_eq!(report.updated, 1);
    let state = store.get(&record.id).await.unwrap().unwrap();
    assert_eq!(state.lifecycle, LifecycleState::Draft);
    assert_eq!(state.last_applied_hash, Some(h2.clone()));

    // Tick 4: intent flips to withdrawn, the draft is deleted.
    source.set(vec![beamtime("bt-1", Intent::Withdrawn, 2026)]).await;
    let report = scheduler.run_once().await.unwrap();
    assert_eq!(report.deleted, 1);

    let state = store.get(&record.id).await.unwrap().unwrap();
    assert_eq!(state.lifecycle, LifecycleState::Deleted);
    assert!(state.remote_doi_id.is_none());
    // Last applied hash keeps its final value; it only moves on success.
    assert_eq!(state.last_applied_hash, Some(h2));
}

#[tokio::test]
async fn at_most_one_draft_per_record() {
    let record = beamtime("bt-1", Intent::Active, 2025);
    let source = Arc::new(StaticSource::new(vec![record.clone()]));
    let registry = Arc::new(FakeRegistry::default());
    let store = Arc::new(InMemoryDraftStore::new());
    let scheduler = Scheduler::new(source, registry.clone(), store.clone(), config());

    for _ in 0..5 {
        scheduler.run_once().await.unwrap();
    }

    // Five ticks, one create: the remote id is stable.
    assert_eq!(registry.created.load(Ordering::SeqCst), 1);
    let state = store.get(&record.id).await.unwrap().unwrap();
    assert_eq!(state.remote_doi_id.as_deref(), Some("10.x/abc0"));
}

#[tokio::test]
async fn file_backed_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("beamtimes.json");
    let state_path = dir.path().join("doi_state.json");

    let records = vec![beamtime("bt-1", Intent::Active, 2025)];
    std::fs::write(&snapshot_path, serde_json::to_vec(&records).unwrap()).unwrap();

    // First process lifetime: converge and stop.
    {
        let scheduler = Scheduler::new(
            Arc::new(JsonBeamtimeSource::new(&snapshot_path)),
            Arc::new(FakeRegistry::default()),
            Arc::new(JsonFileDraftStore::open(&state_path).unwrap()),
            config(),
        );
        let report = scheduler.run_once().await.unwrap();
        assert_eq!(report.created, 1);
    }

    // Second process lifetime: same snapshot, reopened store, no new create.
    let registry = Arc::new(FakeRegistry::default());
    let scheduler = Scheduler::new(
        Arc::new(JsonBeamtimeSource::new(&snapshot_path)),
        registry.clone(),
        Arc::new(JsonFileDraftStore::open(&state_path).unwrap()),
        config(),
    );
    let report = scheduler.run_once().await.unwrap();
    assert_eq!(report.unchanged, 1);
    assert_eq!(registry.created.load(Ordering::SeqCst), 0);
}
