//! Tick scheduler: fetch, reconcile, apply, persist.
//!
//! One reconciliation pass runs at a time. The interval timer coalesces
//! missed fires, so a slow tick is never followed by a burst of queued
//! ticks hammering the registration service. Within a tick, records are
//! processed by a bounded pool of workers; each record is touched by
//! exactly one worker, so per-record state writes are serialized.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use beamdoi_core::{Error, Result, SchedulerConfig};
use beamdoi_datacite::RegistrationClient;
use beamdoi_store::{DraftState, DraftStateStore};

use crate::decide::{decide, Operation};
use crate::record::{BeamtimeRecord, BeamtimeSource};

/// Outcome counts for one reconciliation tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Transient failures; the same operations will be retried next tick.
    pub retried: usize,
    /// Records blocked on a permanent failure, including ones that became
    /// blocked this tick.
    pub blocked: usize,
    /// Remote metadata divergences found by the drift audit.
    pub drifted: usize,
}

impl TickReport {
    /// Whether the tick finished without unrecovered permanent failures.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.blocked == 0
    }

    fn absorb(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Deleted => self.deleted += 1,
            RecordOutcome::Unchanged => self.unchanged += 1,
            RecordOutcome::Retried => self.retried += 1,
            RecordOutcome::Blocked => self.blocked += 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RecordOutcome {
    Created,
    Updated,
    Deleted,
    Unchanged,
    Retried,
    Blocked,
}

/// Drives the reconciliation loop.
pub struct Scheduler {
    source: Arc<dyn BeamtimeSource>,
    client: Arc<dyn RegistrationClient>,
    store: Arc<dyn DraftStateStore>,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a scheduler over the three collaborators.
    #[must_use]
    pub fn new(
        source: Arc<dyn BeamtimeSource>,
        client: Arc<dyn RegistrationClient>,
        store: Arc<dyn DraftStateStore>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            source,
            client,
            store,
            config,
        }
    }

    /// Run reconciliation ticks until the shutdown signal flips.
    ///
    /// An in-flight tick always drains before the loop exits; the signal is
    /// only observed between ticks.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tick_number: u64 = 0;

        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            workers = self.config.workers,
            "Scheduler started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {
                    info!("Shutdown requested, draining");
                    break;
                }
            }

            tick_number = tick_number.wrapping_add(1);
            let audit = self.config.audit_every_ticks > 0
                && tick_number % self.config.audit_every_ticks == 0;

            match self.tick(audit).await {
                Ok(report) => {
                    info!(
                        tick = tick_number,
                        created = report.created,
                        updated = report.updated,
                        deleted = report.deleted,
                        unchanged = report.unchanged,
                        retried = report.retried,
                        blocked = report.blocked,
                        drifted = report.drifted,
                        "Tick complete"
                    );
                }
                // A fetch failure aborts only this tick; nothing was written.
                Err(e) => warn!(tick = tick_number, error = %e, "Tick aborted"),
            }

            if *shutdown.borrow() {
                info!("Shutdown requested, draining");
                break;
            }
        }

        info!("Scheduler stopped");
    }

    /// Run exactly one reconciliation tick.
    ///
    /// # Errors
    ///
    /// Returns a fetch error if the beamtime snapshot cannot be obtained;
    /// in that case no state was mutated.
    pub async fn run_once(&self) -> Result<TickReport> {
        self.tick(self.config.audit_every_ticks > 0).await
    }

    async fn tick(&self, audit: bool) -> Result<TickReport> {
        debug!("Fetching beamtime snapshot");
        let records = self.source.snapshot().await?;
        debug!(records = records.len(), "Reconciling");

        let mut report = TickReport::default();
        let outcomes: Vec<RecordOutcome> = stream::iter(records)
            .map(|record| self.reconcile_record(record))
            .buffer_unordered(self.config.workers.max(1))
            .collect()
            .await;
        for outcome in outcomes {
            report.absorb(outcome);
        }

        if audit {
            report.drifted = self.audit_drift().await;
        }

        Ok(report)
    }

    /// Reconcile one record end to end: load state, decide, apply, persist.
    /// Failures are contained here so one record never blocks the rest.
    async fn reconcile_record(&self, record: BeamtimeRecord) -> RecordOutcome {
        // A conflicting upsert means another writer won the race; re-read
        // and recompute once rather than overwrite blindly.
        for _ in 0..2 {
            match self.try_reconcile_record(&record).await {
                Err(Error::Conflict { id }) => {
                    warn!(record = %id, "Draft state conflict, recomputing");
                }
                Err(e) => {
                    error!(record = %record.id, error = %e, "Failed to persist draft state");
                    return RecordOutcome::Retried;
                }
                Ok(outcome) => return outcome,
            }
        }
        warn!(record = %record.id, "Draft state conflicted twice, waiting for next tick");
        RecordOutcome::Retried
    }

    async fn try_reconcile_record(&self, record: &BeamtimeRecord) -> Result<RecordOutcome> {
        let state = self
            .store
            .get(&record.id)
            .await?
            .unwrap_or_else(|| DraftState::new(record.id.clone()));
        let operation = decide(record, &state);
        self.apply(record, state, operation).await
    }

    async fn apply(
        &self,
        record: &BeamtimeRecord,
        mut state: DraftState,
        operation: Operation,
    ) -> Result<RecordOutcome> {
        let current_hash = record.metadata.content_hash();

        let outcome = match operation {
            Operation::NoOp => {
                if state.is_blocked_for(&current_hash) {
                    // Reported every tick until cleared or the metadata moves.
                    if let Some(blocked) = &state.blocked {
                        warn!(record = %record.id, reason = %blocked.reason, "Record blocked");
                    }
                    return Ok(RecordOutcome::Blocked);
                }
                return Ok(RecordOutcome::Unchanged);
            }
            Operation::Create(metadata) => match self.client.create(&record.id, &metadata).await {
                Ok(remote_doi_id) => {
                    state.record_create(remote_doi_id, current_hash);
                    RecordOutcome::Created
                }
                Err(e) => self.note_failure(record, &mut state, &e, current_hash),
            },
            Operation::Update {
                remote_doi_id,
                metadata,
            } => match self.client.update(&remote_doi_id, &metadata).await {
                Ok(()) => {
                    state.record_update(current_hash);
                    RecordOutcome::Updated
                }
                Err(e) => self.note_failure(record, &mut state, &e, current_hash),
            },
            Operation::Delete { remote_doi_id } => {
                match self.client.delete(&remote_doi_id).await {
                    // Already gone remotely counts as confirmed absent.
                    Ok(()) | Err(Error::NotFound { .. }) => {
                        state.record_delete();
                        RecordOutcome::Deleted
                    }
                    Err(e) => self.note_failure(record, &mut state, &e, current_hash),
                }
            }
        };

        self.store.upsert(state).await?;
        Ok(outcome)
    }

    fn note_failure(
        &self,
        record: &BeamtimeRecord,
        state: &mut DraftState,
        error: &Error,
        current_hash: beamdoi_core::MetadataHash,
    ) -> RecordOutcome {
        if error.is_transient() {
            state.record_transient_failure();
            warn!(
                record = %record.id,
                retry_count = state.retry_count,
                error = %error,
                "Transient failure, will retry next tick"
            );
            RecordOutcome::Retried
        } else {
            state.record_permanent_failure(error.to_string(), current_hash);
            error!(record = %record.id, error = %error, "Permanent failure, record blocked");
            RecordOutcome::Blocked
        }
    }

    /// Compare remote metadata against the last applied hash for every
    /// record that should have a live draft. Report-only: divergence is
    /// logged and counted, never reconciled automatically.
    async fn audit_drift(&self) -> usize {
        let states = match self.store.list().await {
            Ok(states) => states,
            Err(e) => {
                warn!(error = %e, "Drift audit skipped: cannot list draft states");
                return 0;
            }
        };

        let mut drifted = 0usize;
        for state in states {
            if !state.lifecycle.has_remote() {
                continue;
            }
            let Some(remote_doi_id) = state.remote_doi_id.as_deref() else {
                continue;
            };
            match self.client.fetch(remote_doi_id).await {
                Ok(remote) => {
                    let remote_hash = remote.content_hash();
                    if state.last_applied_hash.as_ref() != Some(&remote_hash) {
                        warn!(
                            record = %state.id,
                            doi_id = remote_doi_id,
                            "Remote metadata drifted from last applied state"
                        );
                        drifted += 1;
                    }
                }
                Err(Error::NotFound { .. }) => {
                    warn!(
                        record = %state.id,
                        doi_id = remote_doi_id,
                        "Remote draft missing despite live local state"
                    );
                    drifted += 1;
                }
                Err(e) => {
                    debug!(record = %state.id, error = %e, "Drift check skipped");
                }
            }
        }
        drifted
    }
}
