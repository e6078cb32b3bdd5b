use thiserror::Error;

use amb_adapters::AdapterError;
use amb_arbiter::ArbiterError;
use amb_incident::IncidentError;
use amb_placement::PlacementError;

#[derive(Debug, Error)]
pub enum DirectorError {
    #[error("director configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Arbiter(#[from] ArbiterError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Incident(#[from] IncidentError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

pub type DirectorResult<T> = Result<T, DirectorError>;
