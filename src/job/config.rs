use bon::Builder;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Constructor missing expected config filePath.")]
    MissingFilePath,
}

/// Per-job configuration, immutable once the job exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct FetchConfig {
    /// Local path or `http(s)` URL to copy from
    #[builder(into)]
    pub file_path: Option<String>,

    /// Explicit destination, overriding the computed one
    #[builder(into)]
    pub destination: Option<PathBuf>,

    #[serde(default = "default_temporary_directory")]
    #[builder(into, default = default_temporary_directory())]
    pub temporary_directory: PathBuf,

    /// Custom processor ids in priority order
    #[serde(default, deserialize_with = "lenient_ids")]
    #[builder(default)]
    pub processors: Vec<String>,

    #[serde(default, rename = "keep_original_filename")]
    #[builder(default)]
    pub keep_original_filename: bool,
}

fn default_temporary_directory() -> PathBuf {
    PathBuf::from("/tmp")
}

/// Accept any JSON shape for `processors`, keeping only string entries
fn lenient_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Ids {
        List(Vec<serde_json::Value>),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Ids::deserialize(deserializer)? {
        Ids::List(values) => values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Ids::Other(_) => Vec::new(),
    })
}

impl FetchConfig {
    /// Configuration for `file_path` with every other field defaulted
    pub fn for_source(file_path: impl Into<String>) -> Self {
        Self::builder().file_path(file_path).build()
    }

    /// The source identifier, which every job requires
    pub fn source(&self) -> Result<&str, ConfigError> {
        self.file_path
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingFilePath)
    }
}

/// Validate an optional configuration, returning it with its source
pub fn validate(config: Option<FetchConfig>) -> Result<(String, FetchConfig), ConfigError> {
    let config = config.ok_or(ConfigError::MissingFilePath)?;
    let source = config.source()?.to_string();
    Ok((source, config))
}
