//! Engine errors.

use thiserror::Error;

use herd_types::{GroupAction, GroupId};

use crate::config::ConfigError;

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Error loading configuration
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A group or snapshot named a policy that is not configured
    #[error("unknown policy '{0}'")]
    UnknownPolicy(String),

    /// A policy was asked to run an action it has no handler for
    #[error("policy '{policy}' has no handler for action '{action}'")]
    UnhandledAction { policy: String, action: GroupAction },

    /// Behavior memory belongs to a different policy family
    #[error("policy '{policy}' cannot own {found} memory")]
    PolicyMismatch { policy: String, found: String },

    #[error("unknown group {0}")]
    UnknownGroup(GroupId),

    /// Behavior memory or snapshot could not be encoded or decoded
    #[error("persistence error: {0}")]
    Persistence(#[from] serde_json::Error),

    /// Snapshot file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Internal-consistency violations that must abort the tick driver.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::UnhandledAction { .. } | EngineError::PolicyMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
