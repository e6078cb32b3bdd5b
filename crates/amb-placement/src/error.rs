use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("placement configuration error: {0}")]
    Config(String),
}

pub type PlacementResult<T> = Result<T, PlacementError>;
