//! Snapshot Types
//!
//! Serialized form of a group, handed to the external save manager.
//!
//! Member and sentry references are stored as raw identifier strings. They
//! are resolved against the live world lazily, after load, so groups can be
//! restored before the agents they reference.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Alertness, GroupAction, GroupId, Role, SimTime};

/// Persisted state of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub group_id: GroupId,
    /// Name of the configured policy governing the group
    pub policy: String,
    /// Raw member identifiers
    pub members: Vec<String>,
    /// Raw member identifier to role
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub roles: BTreeMap<String, Role>,
    #[serde(default)]
    pub alertness: Alertness,
    #[serde(default)]
    pub action: GroupAction,
    /// Policy-owned behavior memory, as produced by the memory's save routine
    pub memory: serde_json::Value,
    /// World time at which the snapshot was taken
    pub saved_at: SimTime,
}

impl GroupSnapshot {
    /// Serializes the snapshot to a JSON string.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(SnapshotError)
    }

    /// Parses a snapshot from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(SnapshotError)
    }
}

/// Error converting a snapshot to or from JSON.
#[derive(Debug)]
pub struct SnapshotError(pub serde_json::Error);

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "snapshot serialization error: {}", self.0)
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}
