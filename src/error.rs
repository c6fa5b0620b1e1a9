//! Error types for filter construction and mutation

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FilterError>;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Construction failed after {attempts} attempts")]
    ConstructionFailed { attempts: usize },

    #[error("Input key set looks broken: {0}")]
    InputLikelyBroken(String),

    #[error("Filter is at capacity")]
    CapacityExhausted,

    #[error("Operation not supported: {0}")]
    UnsupportedOperation(&'static str),

    #[error("Invalid filter format: {0}")]
    InvalidFormat(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
