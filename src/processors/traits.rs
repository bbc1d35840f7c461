use async_trait::async_trait;
use reqwest::Url;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::state::{CopyStatus, TimeBudget, TransferState};
use crate::http::HttpError;
use crate::naming::{DestinationNaming, OriginalFileName};

/// Processor errors
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("not a remote source: {0}")]
    InvalidUrl(String),
    #[error("source does not support {processor} transfers: {source_id}")]
    Unsupported {
        processor: String,
        source_id: String,
    },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("source changed since the transfer started")]
    SourceChanged,
    #[error("partial file {} holds {actual} bytes, expected at least {expected}", .path.display())]
    PartialFileMismatch {
        path: PathBuf,
        actual: u64,
        expected: u64,
    },
    #[error("transfer ended early: {copied} of {total} bytes")]
    Incomplete { copied: u64, total: u64 },
    #[error("{0} transfers cannot restart after partial progress")]
    NotRestartable(String),
}

impl ProcessorError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| ProcessorError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Inputs a processor needs to lay out a fresh transfer
pub struct SetupContext<'a> {
    /// Explicit destination, overriding any computed path
    pub destination: Option<&'a Path>,
    pub keep_original_filename: bool,
    pub naming: &'a dyn DestinationNaming,
}

impl SetupContext<'_> {
    /// Destination for a remote source: override, or a name under `temporary_directory`
    pub fn remote_destination(&self, url: &Url, temporary_directory: &Path) -> PathBuf {
        if let Some(destination) = self.destination {
            return destination.to_path_buf();
        }
        let name = if self.keep_original_filename {
            OriginalFileName.file_name(url)
        } else {
            self.naming.file_name(url)
        };
        temporary_directory.join(name)
    }
}

/// A transfer strategy
///
/// A processor is bound to a job once, at construction, and owns every later
/// mutation of that job's [`TransferState`]. `copy` may only move
/// `total_bytes_copied` forward; on error the state must still describe what is
/// on disk so a later run can pick it up.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Stable identifier persisted in the transfer state
    fn name(&self) -> &str;

    /// Whether a run can stop early and resume later. Jobs bound to a
    /// processor that returns false refuse time limits.
    fn supports_interruption(&self) -> bool {
        true
    }

    /// Whether this processor can handle the source in `state`
    async fn is_compatible(&self, state: &TransferState) -> bool;

    /// Fill in destination, sizes and cursor for a brand new transfer
    async fn setup_state(
        &self,
        state: TransferState,
        ctx: &SetupContext<'_>,
    ) -> Result<TransferState, ProcessorError>;

    /// Run one copy attempt within `budget`
    async fn copy(
        &self,
        state: &mut TransferState,
        budget: TimeBudget,
    ) -> Result<CopyStatus, ProcessorError>;
}
