use crate::http::HttpConfig;
use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub transfer: TransferSettings,
    #[serde(default)]
    pub http: HttpSettings,
}

/// Where job records are kept
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/jobs")
}

/// Defaults applied to new jobs and the built-in processors
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransferSettings {
    #[serde(default = "default_temporary_directory")]
    pub temporary_directory: PathBuf,
    /// Read size for local copies; the time budget is checked once per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: ByteSize,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            temporary_directory: default_temporary_directory(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_temporary_directory() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_chunk_size() -> ByteSize {
    ByteSize::mib(1)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpSettings {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpSettings {
    pub fn to_http_config(&self) -> HttpConfig {
        HttpConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_read_timeout_secs() -> u64 {
    60
}

fn default_user_agent() -> String {
    HttpConfig::default().user_agent
}
