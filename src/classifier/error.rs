use std::time::Duration;
use thiserror::Error;

/// Why a tick's classification produced no result.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("failed to encode face crop: {0}")]
    Encode(String),

    #[error("classification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("classification service returned HTTP {0}")]
    Status(u16),

    #[error("malformed classification response: {0}")]
    Malformed(String),

    /// The service answered without `probabilities`; the tick is dropped quietly.
    #[error("classification response carried no probabilities")]
    Incomplete,

    #[error("classification timed out after {0:?}")]
    Timeout(Duration),

    #[error("pipeline worker failed: {0}")]
    Worker(String),
}

impl ClassifyError {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ClassifyError::Incomplete)
    }
}
