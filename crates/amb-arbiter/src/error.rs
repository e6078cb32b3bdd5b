use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArbiterError {
    #[error("arbiter configuration error: {0}")]
    Config(String),
}

pub type ArbiterResult<T> = Result<T, ArbiterError>;
