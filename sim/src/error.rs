//! Error types for the simulation core.

use crate::components::UnitId;
use thiserror::Error;

/// Errors surfaced by the public simulation API.
///
/// None of these are fatal to the tick loop: spawns are rejected, stale fire
/// events are dropped, and the simulation keeps running.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("unit capacity exceeded (max {capacity} units)")]
    CapacityExceeded { capacity: usize },

    #[error("target {0:?} is no longer alive")]
    InvalidTarget(UnitId),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading or validating a [`crate::config::SimConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
