use thiserror::Error;

use amb_core::{EntityHandle, IncidentId, Vec3};
use amb_world::{DirectiveError, WorldError};

use crate::{IncidentKind, Phase, Role};

#[derive(Debug, Error)]
pub enum IncidentError {
    #[error("incident {0} not found")]
    NotFound(IncidentId),

    #[error("{kind} incident needs a {role} member")]
    MissingRole { kind: IncidentKind, role: Role },

    #[error("entity {0} does not exist or is dead")]
    Unavailable(EntityHandle),

    #[error("entity {0} is not held by the creating owner")]
    NotOwned(EntityHandle),

    #[error("entity {0} already belongs to another active incident")]
    EntityInUse(EntityHandle),

    #[error("position {0} overlaps an active incident")]
    Overlap(Vec3),

    #[error("interaction rejected by incident {id}: {reason}")]
    InteractionRejected { id: IncidentId, reason: &'static str },

    #[error("no valid position found")]
    NoPlacement,

    #[error("could not acquire spawned entity {0}")]
    AcquisitionFailed(EntityHandle),

    #[error("illegal transition {from} -> {to}")]
    IllegalTransition { from: Phase, to: Phase },

    #[error("directive failed: {0}")]
    Directive(#[from] DirectiveError),

    #[error("world error: {0}")]
    World(#[from] WorldError),

    #[error("incident configuration error: {0}")]
    Config(String),
}

pub type IncidentResult<T> = Result<T, IncidentError>;
