//! Application settings for filefetch
//!
//! Settings are layered:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use filefetch::config::Settings;
//!
//! let settings = Settings::load().expect("Failed to load settings");
//! println!("Job records live in: {}", settings.store.path.display());
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `FILEFETCH__<section>__<key>`:
//! - `FILEFETCH__STORE__PATH=/var/lib/filefetch/jobs`
//! - `FILEFETCH__TRANSFER__CHUNK_SIZE=4MB`
//! - `FILEFETCH__HTTP__READ_TIMEOUT_SECS=120`
//!
//! # Configuration File
//!
//! By default settings are read from `config/filefetch.toml`; the
//! `FILEFETCH_CONFIG` environment variable points elsewhere.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{HttpSettings, Settings, StoreSettings, TransferSettings};
pub use validation::ValidationError;

use crate::http::{HttpClient, HttpError};
use crate::processors::ProcessorRegistry;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Settings validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Settings {
    /// Load settings from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is malformed or a value fails
    /// validation.
    pub fn load() -> Result<Self, SettingsError> {
        let settings = sources::load()?;
        validation::validate(&settings)?;
        Ok(settings)
    }

    /// Load settings from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, SettingsError> {
        let settings = sources::load_from_sources(path)?;
        validation::validate(&settings)?;
        Ok(settings)
    }

    /// Processor registry wired with these HTTP and chunk settings
    pub fn processor_registry(&self) -> Result<ProcessorRegistry, HttpError> {
        let client = HttpClient::new(self.http.to_http_config())?;
        Ok(ProcessorRegistry::new(client, self.transfer.chunk_size))
    }
}
