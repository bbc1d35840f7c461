use thiserror::Error;

use super::config::ConfigError;
use crate::processors::ProcessorError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transfer state encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Processor setup failed: {0}")]
    Setup(#[from] ProcessorError),

    #[error("Persisted record names unknown processor '{0}'")]
    UnknownProcessor(String),
}

pub type Result<T> = std::result::Result<T, JobError>;
