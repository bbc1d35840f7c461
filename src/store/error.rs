use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Keyspace error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Job record encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected key in jobs partition: {0}")]
    InvalidKey(String),

    #[error("Store directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Memory store lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;
