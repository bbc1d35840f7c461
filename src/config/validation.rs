use super::models::Settings;
use crate::humanize::ByteSize;
use crate::processors::MAX_CHUNK_SIZE;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("transfer.chunk_size must be positive")]
    ZeroChunkSize,

    #[error("transfer.chunk_size {size} exceeds the maximum of {max}")]
    ChunkSizeTooLarge { size: ByteSize, max: ByteSize },

    #[error("Timeout must be positive: {field} = 0")]
    ZeroTimeout { field: String },

    #[error("http.user_agent must not be empty")]
    EmptyUserAgent,

    #[error("transfer.temporary_directory must not be empty")]
    EmptyTemporaryDirectory,
}

/// Validate the entire settings tree
pub fn validate(settings: &Settings) -> Result<(), ValidationError> {
    validate_transfer(settings)?;
    validate_http(settings)?;
    Ok(())
}

fn validate_transfer(settings: &Settings) -> Result<(), ValidationError> {
    if settings.transfer.chunk_size.as_u64() == 0 {
        return Err(ValidationError::ZeroChunkSize);
    }
    if settings.transfer.chunk_size > MAX_CHUNK_SIZE {
        return Err(ValidationError::ChunkSizeTooLarge {
            size: settings.transfer.chunk_size,
            max: MAX_CHUNK_SIZE,
        });
    }
    if settings.transfer.temporary_directory.as_os_str().is_empty() {
        return Err(ValidationError::EmptyTemporaryDirectory);
    }
    Ok(())
}

fn validate_http(settings: &Settings) -> Result<(), ValidationError> {
    let timeouts = [
        ("http.connect_timeout_secs", settings.http.connect_timeout_secs),
        ("http.read_timeout_secs", settings.http.read_timeout_secs),
    ];
    if let Some((field, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
        return Err(ValidationError::ZeroTimeout {
            field: field.to_string(),
        });
    }

    if settings.http.user_agent.trim().is_empty() {
        return Err(ValidationError::EmptyUserAgent);
    }

    Ok(())
}
