//! Shared identifier, time and state types for the group AI engine.
//!
//! This crate contains pure data structures with no behavior logic.
//! It is a dependency for all other crates in the workspace.

pub mod ids;
pub mod snapshot;
pub mod state;
pub mod timestamp;

// Re-export identifier types
pub use ids::{AgentId, GroupId, KindId, Layer, PlaceId, Placement};

// Re-export timestamp types
pub use timestamp::{
    SimTime, TimeOfDay, HOURS_PER_DAY, SECONDS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MINUTE,
};

// Re-export state types
pub use state::{Alertness, GroupAction, Role};

// Re-export snapshot types
pub use snapshot::{GroupSnapshot, SnapshotError};
