use thiserror::Error;

use crate::types::{Backend, Phase};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Retrieval backend {backend} unavailable: {reason}")]
    RetrievalUnavailable { backend: Backend, reason: String },

    #[error("Reasoning backend failure: {0}")]
    ReasoningBackend(String),

    #[error("Trajectory finalized before phase {0} was recorded")]
    IncompleteTrajectory(Phase),

    #[error("Run cancelled between phases")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
