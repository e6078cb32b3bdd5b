//! World-interface error types.

use thiserror::Error;

use amb_core::EntityHandle;

/// A directive the host refused or could not apply.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DirectiveError {
    #[error("entity {0} no longer exists")]
    Missing(EntityHandle),

    #[error("entity {0} is dead")]
    Dead(EntityHandle),

    #[error("entity {0} is mid-transition and cannot take a new task")]
    Busy(EntityHandle),

    #[error("directive for {entity} rejected: {reason}")]
    Rejected {
        entity: EntityHandle,
        reason: String,
    },
}

pub type DirectiveResult = Result<(), DirectiveError>;

/// Host-side failures outside the directive path (spawning, lookups).
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),

    #[error("entity {0} does not exist")]
    Missing(EntityHandle),

    #[error(transparent)]
    Core(#[from] amb_core::CoreError),
}

pub type WorldResult<T> = Result<T, WorldError>;
