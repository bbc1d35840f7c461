use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

/// Everything a processor needs to pick a transfer back up
///
/// The byte cursor is `total_bytes_copied`: every processor resumes at exactly
/// that offset. `validator` pins the remote entity a ranged transfer started
/// against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferState {
    pub source: String,
    pub destination: PathBuf,
    #[serde(default)]
    pub processor: String,
    pub temporary: bool,
    pub temporary_directory: PathBuf,
    pub total_bytes: u64,
    pub total_bytes_copied: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
}

impl TransferState {
    pub fn new(source: impl Into<String>, temporary_directory: impl Into<PathBuf>) -> Self {
        let source = source.into();
        Self {
            destination: PathBuf::from(&source),
            source,
            processor: String::new(),
            temporary: false,
            temporary_directory: temporary_directory.into(),
            total_bytes: 0,
            total_bytes_copied: 0,
            validator: None,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Bytes still expected, zero while the total is unknown
    pub fn remaining(&self) -> u64 {
        self.total_bytes.saturating_sub(self.total_bytes_copied)
    }

    /// True once a known total has been fully transferred
    pub fn is_complete(&self) -> bool {
        self.total_bytes > 0 && self.total_bytes_copied >= self.total_bytes
    }

    pub(crate) fn advance(&mut self, bytes: usize) {
        self.total_bytes_copied += bytes as u64;
    }
}

/// How a single copy attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Done,
    Stopped,
}

/// Wall-clock budget for one run, checked cooperatively between chunks
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    started: Instant,
    limit: Option<Duration>,
}

impl TimeBudget {
    pub fn start(limit: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn unbounded() -> Self {
        Self::start(None)
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.elapsed() >= limit)
    }
}
