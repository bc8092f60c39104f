//! Pure reconciliation decision.
//!
//! `decide` is deterministic given its two inputs and performs no I/O.
//! Calling it twice with the same (record, state) pair yields the same
//! operation, which is what makes per-tick retries safe: nothing about a
//! failed attempt changes the next decision.

use beamdoi_core::{Intent, LifecycleState};
use beamdoi_datacite::DoiMetadata;
use beamdoi_store::DraftState;

use crate::record::BeamtimeRecord;

/// The one operation a record needs to converge; transient, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Register a new draft DOI.
    Create(DoiMetadata),
    /// Push changed metadata to the existing remote draft.
    Update {
        remote_doi_id: String,
        metadata: DoiMetadata,
    },
    /// Delete the remote draft.
    Delete { remote_doi_id: String },
    /// Nothing to do.
    NoOp,
}

impl Operation {
    /// Whether this operation performs a remote call.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::NoOp)
    }
}

/// Compute the minimal operation for one record.
pub fn decide(record: &BeamtimeRecord, state: &DraftState) -> Operation {
    let current_hash = record.metadata.content_hash();

    // A permanent failure blocks the record until its metadata changes;
    // the stored hash is the one that failed. Applies to deletes too, so a
    // draft the registry refuses to remove is not re-attempted every tick.
    if state.is_blocked_for(&current_hash) {
        return Operation::NoOp;
    }

    match record.intent {
        Intent::Withdrawn => match &state.remote_doi_id {
            Some(remote_doi_id) if state.lifecycle.has_remote() => Operation::Delete {
                remote_doi_id: remote_doi_id.clone(),
            },
            _ => Operation::NoOp,
        },
        Intent::Active => {
            match (state.lifecycle, &state.remote_doi_id) {
                // Deleted is terminal: an intent flip back to active means
                // a brand-new draft, never a resurrection of the old id.
                (LifecycleState::None | LifecycleState::Deleted, _) => {
                    Operation::Create(record.metadata.clone())
                }
                (LifecycleState::Draft | LifecycleState::Registered, Some(remote_doi_id)) => {
                    if state.last_applied_hash.as_ref() == Some(&current_hash) {
                        Operation::NoOp
                    } else {
                        Operation::Update {
                            remote_doi_id: remote_doi_id.clone(),
                            metadata: record.metadata.clone(),
                        }
                    }
                }
                // Live lifecycle without a remote id: the handle was lost,
                // so the only way to converge is a fresh draft.
                (LifecycleState::Draft | LifecycleState::Registered, None) => {
                    Operation::Create(record.metadata.clone())
                }
            }
        }
    }
}
