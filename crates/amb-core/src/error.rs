//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where they need to.

use thiserror::Error;

use crate::{EntityHandle, IncidentId};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("entity {0} does not exist")]
    EntityNotFound(EntityHandle),

    #[error("incident {0} not found")]
    IncidentNotFound(IncidentId),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
