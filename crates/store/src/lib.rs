//! Draft state persistence.
//!
//! The store is the single shared mutable resource of the service. All
//! writes go through a compare-and-swap on a per-record generation counter,
//! so two writers racing on the same record surface as a conflict instead
//! of a silent overwrite.

pub mod file;
pub mod state;
pub mod store;

pub use file::JsonFileDraftStore;
pub use state::{Blocked, DraftState};
pub use store::{DraftStateStore, InMemoryDraftStore};
