//! Shared identifier and lifecycle types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a beamtime record, unique across polls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeamtimeId(String);

impl BeamtimeId {
    /// Create a beamtime id from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BeamtimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BeamtimeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Desired lifecycle intent of a beamtime record, owned by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// The dataset should have a DOI draft.
    Active,
    /// The beamtime record was withdrawn; any draft must be removed.
    Withdrawn,
}

/// Lifecycle state of the remote DOI for one beamtime record.
///
/// Advances only forward: `None -> Draft -> Registered -> Deleted`. A
/// registered DOI is never silently un-registered; it can only be deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No remote draft exists yet.
    #[default]
    None,
    /// A draft DOI exists remotely but is not findable.
    Draft,
    /// The DOI has been made publicly findable.
    Registered,
    /// The remote draft was deleted; terminal.
    Deleted,
}

impl LifecycleState {
    /// Whether a remote DOI currently exists in this state.
    #[must_use]
    pub fn has_remote(&self) -> bool {
        matches!(self, Self::Draft | Self::Registered)
    }

}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Draft => "draft",
            Self::Registered => "registered",
            Self::Deleted => "deleted",
        };
        write!(f, "{name}")
    }
}

/// Hex-encoded SHA-256 content hash of a metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataHash(String);

impl MetadataHash {
    /// Wrap an already-computed hex digest.
    #[must_use]
    pub fn from_hex(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    /// Get the digest as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetadataHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_remote_only_for_live_states() {
        assert!(!LifecycleState::None.has_remote());
        assert!(LifecycleState::Draft.has_remote());
        assert!(LifecycleState::Registered.has_remote());
        assert!(!LifecycleState::Deleted.has_remote());
    }

    #[test]
    fn beamtime_id_display() {
        let id = BeamtimeId::new("bt-2025-001");
        assert_eq!(id.to_string(), "bt-2025-001");
    }
}
