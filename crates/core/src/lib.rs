//! Core types, errors, and configuration shared across the beamtime DOI
//! service crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DoiConfig, SchedulerConfig};
pub use error::{Error, Result};
pub use types::{BeamtimeId, Intent, LifecycleState, MetadataHash};
