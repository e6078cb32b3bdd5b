use thiserror::Error;

use amb_incident::{IncidentError, IncidentKind};
use amb_world::{DirectiveError, WorldError};

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("adapter configuration error: {0}")]
    Config(String),

    /// Accidents only come from real collisions.
    #[error("{0} incidents cannot be staged")]
    Unstaged(IncidentKind),

    #[error("incident error: {0}")]
    Incident(#[from] IncidentError),

    #[error("world error: {0}")]
    World(#[from] WorldError),

    #[error("directive failed: {0}")]
    Directive(#[from] DirectiveError),
}

pub type AdapterResult<T> = Result<T, AdapterError>;
