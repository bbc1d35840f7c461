//! Destination file handling shared by the processors

use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncSeekExt;
use tracing::warn;

use super::traits::ProcessorError;

async fn ensure_parent(path: &Path) -> Result<(), ProcessorError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .await
            .map_err(ProcessorError::io(parent)),
        _ => Ok(()),
    }
}

/// Open a partial destination positioned at `offset`
///
/// Bytes past `offset` were written by an attempt whose progress never made it
/// into the state, so they are cut off. A file shorter than `offset` means data
/// the state counts is gone.
pub(crate) async fn open_for_resume(path: &Path, offset: u64) -> Result<File, ProcessorError> {
    ensure_parent(path).await?;

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await
        .map_err(ProcessorError::io(path))?;

    let len = file
        .metadata()
        .await
        .map_err(ProcessorError::io(path))?
        .len();

    if len < offset {
        return Err(ProcessorError::PartialFileMismatch {
            path: path.to_path_buf(),
            actual: len,
            expected: offset,
        });
    }
    if len > offset {
        warn!(path = %path.display(), len, offset, "Truncating unrecorded bytes from partial file");
        file.set_len(offset).await.map_err(ProcessorError::io(path))?;
    }

    file.seek(SeekFrom::Start(offset))
        .await
        .map_err(ProcessorError::io(path))?;
    Ok(file)
}

/// Create (or empty) the destination for a transfer that starts from zero
pub(crate) async fn create_truncated(path: &Path) -> Result<File, ProcessorError> {
    ensure_parent(path).await?;
    File::create(path).await.map_err(ProcessorError::io(path))
}
