//! DOI lifecycle reconciliation engine.
//!
//! The split mirrors the control flow: a pure decision function
//! ([`decide`]) computes the one operation a record needs, and the
//! [`Scheduler`] drives fetch/reconcile/apply/persist ticks around it on a
//! fixed interval.
//!
//! The decision function takes no locks and performs no I/O, which is what
//! makes the lifecycle testable without a live registration service and
//! retries safe: a failed operation is simply recomputed from unchanged
//! state on the next tick.

pub mod decide;
pub mod record;
pub mod scheduler;

pub use decide::{decide, Operation};
pub use record::{BeamtimeRecord, BeamtimeSource, JsonBeamtimeSource, StaticSource};
pub use scheduler::{Scheduler, TickReport};
