//! Error taxonomy for the simulation kernel.

use crate::entity::EntityId;

/// Errors produced by simulation operations.
///
/// Faults raised inside a single entity's update or collision reaction are
/// logged and contained by the registry; only construction, configuration and
/// lifecycle failures reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A value supplied at construction time is out of range.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An entity's transform has no inverse (e.g. a zero scale axis).
    #[error("transform of entity {entity} is degenerate (determinant {determinant})")]
    TransformDegenerate { entity: EntityId, determinant: f64 },

    /// A modifiable stat was referenced by a name that does not exist.
    #[error("no stat named '{name}'. Known stats: [{known}]")]
    LookupMiss { name: String, known: String },

    /// The simulation thread did not acknowledge a stop request in time.
    #[error("simulation thread did not stop within {timeout_ms} ms")]
    StopTimeout { timeout_ms: u64 },

    /// The simulation thread could not be started.
    #[error("failed to start simulation thread: {0}")]
    ThreadSpawn(std::io::Error),

    /// The simulation thread panicked.
    #[error("simulation thread panicked: {0}")]
    ThreadPanicked(String),

    /// A configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// An arena operation failed.
    #[error(transparent)]
    Ecs(#[from] contrail_ecs::EcsError),
}

impl SimError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SimError::Configuration(msg.into())
    }
}
