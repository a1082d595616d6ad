//! Error types for the simulation engine.

use crate::config::ConfigError;
use thiserror::Error;

/// Error raised by engine stages, commands and storage.
///
/// Validation variants are returned to the caller before any state is
/// mutated. Runtime failures inside a tick are caught per entity and logged.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid ship type: {0}")]
    InvalidShipType(String),

    #[error("Shipyard {shipyard_id} is at maximum capacity ({capacity})")]
    CapacityExceeded { shipyard_id: u64, capacity: u32 },

    #[error("No wormhole connects system {from} to system {to}")]
    NoWormhole { from: u64, to: u64 },

    #[error("Invalid behavior configuration for '{behavior}': {reason}")]
    InvalidBehaviorConfig { behavior: String, reason: String },

    #[error("Insufficient resources: {0}")]
    InsufficientResources(String),

    #[error("Behavior {0} cannot execute for this agent")]
    CannotExecute(String),

    #[error("Behavior {behavior} panicked: {message}")]
    BehaviorPanicked { behavior: String, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the error was a rejected request rather than a failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InvalidShipType(_)
                | Self::CapacityExceeded { .. }
                | Self::NoWormhole { .. }
                | Self::InvalidBehaviorConfig { .. }
                | Self::InsufficientResources(_)
                | Self::NotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
