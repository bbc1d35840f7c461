use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle status of a fetch job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Running,
    Stopped,
    Done,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done)
    }
}

/// Outcome of the latest run
///
/// `data` is the JSON-encoded transfer state; `error` carries the diagnostic
/// when the run failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub status: JobStatus,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    pub fn new(status: JobStatus, data: String, error: Option<String>) -> Self {
        Self {
            status,
            data,
            error,
        }
    }
}

/// Everything persisted for a job between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub time_limit: Option<Duration>,
    pub result: JobResult,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(time_limit: Option<Duration>, result: JobResult) -> Self {
        Self {
            time_limit,
            result,
            updated_at: Utc::now(),
        }
    }
}
