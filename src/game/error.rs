//! Error types for the simulation core and its configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::game::steering::Behavior;
use crate::game::vehicle::VehicleId;

/// Contract violations detected while stepping the simulation.
///
/// These are programmer errors (a behaviour switched on before its target was
/// wired up, a stale handle) surfaced as values so the shell can log them and
/// pause instead of carrying on with undefined state.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SteeringError {
    /// A behaviour that needs a target agent was evaluated without one.
    #[error("{behavior} is enabled but its target agent is not set")]
    MissingTarget { behavior: Behavior },

    /// OffsetPursuit was evaluated without a formation offset.
    #[error("offset pursuit is enabled but no offset is set")]
    MissingOffset,

    /// A handle does not name any agent in the world.
    #[error("no agent with handle {0:?}")]
    UnknownAgent(VehicleId),

    /// A heading was not unit length.
    #[error("heading must be unit length, got length {length}")]
    NonUnitHeading { length: f64 },
}

/// Failures loading or validating simulation parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("invalid parameter: {0}")]
    Invalid(String),
}

pub type SteeringResult<T> = std::result::Result<T, SteeringError>;
