//! Per-record reconciliation state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use beamdoi_core::{BeamtimeId, LifecycleState, MetadataHash};

/// Marker set after a permanent failure.
///
/// Holds the metadata hash at the time of the failure: as long as the
/// record's metadata still hashes to this value, re-issuing the operation
/// would fail identically, so the scheduler skips it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocked {
    pub reason: String,
    pub metadata_hash: MetadataHash,
}

/// Last known reconciliation state for one beamtime record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftState {
    pub id: BeamtimeId,
    /// Identifier of the remote draft, once one exists.
    pub remote_doi_id: Option<String>,
    /// Hash of the metadata last accepted by the remote service. Never set
    /// optimistically; only after a confirmed create/update.
    pub last_applied_hash: Option<MetadataHash>,
    pub lifecycle: LifecycleState,
    pub last_sync: DateTime<Utc>,
    /// Consecutive transient failures since the last success.
    pub retry_count: u32,
    pub blocked: Option<Blocked>,
    /// Write counter backing compare-and-swap upserts.
    pub generation: u64,
}

impl DraftState {
    /// Initial state for a record never seen before.
    #[must_use]
    pub fn new(id: BeamtimeId) -> Self {
        Self {
            id,
            remote_doi_id: None,
            last_applied_hash: None,
            lifecycle: LifecycleState::None,
            last_sync: Utc::now(),
            retry_count: 0,
            blocked: None,
            generation: 0,
        }
    }

    /// Record a confirmed draft creation.
    ///
    /// Also covers re-activation after a confirmed deletion: the record is
    /// treated as brand new and the old remote identifier is discarded.
    pub fn record_create(&mut self, remote_doi_id: impl Into<String>, hash: MetadataHash) {
        self.remote_doi_id = Some(remote_doi_id.into());
        self.last_applied_hash = Some(hash);
        self.lifecycle = LifecycleState::Draft;
        self.mark_success();
    }

    /// Record a confirmed metadata update. The lifecycle state is
    /// unchanged; only the applied hash moves.
    pub fn record_update(&mut self, hash: MetadataHash) {
        self.last_applied_hash = Some(hash);
        self.mark_success();
    }

    /// Record a confirmed draft deletion. Terminal; the remote identifier
    /// is cleared so it can never be reused.
    pub fn record_delete(&mut self) {
        self.remote_doi_id = None;
        self.lifecycle = LifecycleState::Deleted;
        self.mark_success();
    }

    /// Record a transient failure. Lifecycle, remote id, and applied hash
    /// stay untouched so the next tick recomputes the same operation.
    pub fn record_transient_failure(&mut self) {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_sync = Utc::now();
    }

    /// Record a permanent failure, blocking the record until its metadata
    /// hash changes.
    pub fn record_permanent_failure(&mut self, reason: impl Into<String>, hash: MetadataHash) {
        self.blocked = Some(Blocked {
            reason: reason.into(),
            metadata_hash: hash,
        });
        self.last_sync = Utc::now();
    }

    /// Whether the record is blocked for the given current metadata hash.
    #[must_use]
    pub fn is_blocked_for(&self, hash: &MetadataHash) -> bool {
        self.blocked
            .as_ref()
            .is_some_and(|b| &b.metadata_hash == hash)
    }

    fn mark_success(&mut self) {
        self.retry_count = 0;
        self.blocked = None;
        self.last_sync = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(s: &str) -> MetadataHash {
        MetadataHash::from_hex(s)
    }

    #[test]
    fn new_state_has_no_remote() {
        let state = DraftState::new(BeamtimeId::new("bt-1"));
        assert_eq!(state.lifecycle, LifecycleState::None);
        assert!(state.remote_doi_id.is_none());
        assert!(state.last_applied_hash.is_none());
        assert_eq!(state.retry_count, 0);
    }

    #[test]
    fn create_advances_to_draft() {
        let mut state = DraftState::new(BeamtimeId::new("bt-1"));
        state.record_create("10.1/abc", hash("h1"));

        assert_eq!(state.lifecycle, LifecycleState::Draft);
        assert_eq!(state.remote_doi_id.as_deref(), Some("10.1/abc"));
        assert_eq!(state.last_applied_hash, Some(hash("h1")));
    }

    #[test]
    fn delete_clears_remote_id() {
        let mut state = DraftState::new(BeamtimeId::new("bt-1"));
        state.record_create("10.1/abc", hash("h1"));
        state.record_delete();

        assert_eq!(state.lifecycle, LifecycleState::Deleted);
        assert!(state.remote_doi_id.is_none());
    }

    #[test]
    fn transient_failure_only_bumps_retry_count() {
        let mut state = DraftState::new(BeamtimeId::new("bt-1"));
        state.record_transient_failure();
        state.record_transient_failure();

        assert_eq!(state.retry_count, 2);
        assert_eq!(state.lifecycle, LifecycleState::None);
        assert!(state.last_applied_hash.is_none());
    }

    #[test]
    fn success_clears_retries_and_block() {
        let mut state = DraftState::new(BeamtimeId::new("bt-1"));
        state.record_transient_failure();
        state.record_permanent_failure("bad year", hash("h1"));

        state.record_create("10.1/abc", hash("h2"));
        assert_eq!(state.retry_count, 0);
        assert!(state.blocked.is_none());
    }

    #[test]
    fn blocked_only_for_matching_hash() {
        let mut state = DraftState::new(BeamtimeId::new("bt-1"));
        state.record_permanent_failure("bad creators", hash("h1"));

        assert!(state.is_blocked_for(&hash("h1")));
        assert!(!state.is_blocked_for(&hash("h2")));
    }
}
