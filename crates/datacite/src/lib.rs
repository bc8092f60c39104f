//! DataCite registration client and DOI metadata schema.
//!
//! The client is a thin, stateless boundary: one request/response exchange
//! per call, no internal retries. Retry policy belongs to the scheduler,
//! which classifies failures through the shared error taxonomy.

pub mod client;
pub mod metadata;

pub use client::{DataCiteClient, NullClient, RegistrationClient};
pub use metadata::{
    AlternateIdentifier, Creator, DateEntry, DoiMetadata, RelatedIdentifier, RightsEntry, Title,
};
