use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

use super::partial::open_for_resume;
use super::state::{CopyStatus, TimeBudget, TransferState};
use super::traits::{Processor, ProcessorError, SetupContext};
use crate::http::remote_url;
use crate::humanize::ByteSize;

pub const LOCAL: &str = "local";

/// Largest read buffer a local copy allocates
pub const MAX_CHUNK_SIZE: ByteSize = ByteSize::mib(64);

/// Copies sources that already live on the local filesystem
///
/// Without a destination override the source is used in place and a run has
/// nothing to move.
#[derive(Debug, Clone)]
pub struct LocalProcessor {
    chunk_size: ByteSize,
}

impl LocalProcessor {
    /// Chunk sizes are clamped to `1..=MAX_CHUNK_SIZE`
    pub fn new(chunk_size: ByteSize) -> Self {
        Self {
            chunk_size: chunk_size.clamp(ByteSize(1), MAX_CHUNK_SIZE),
        }
    }

    pub fn chunk_size(&self) -> ByteSize {
        self.chunk_size
    }
}

impl Default for LocalProcessor {
    fn default() -> Self {
        Self::new(ByteSize::mib(1))
    }
}

async fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[async_trait]
impl Processor for LocalProcessor {
    fn name(&self) -> &str {
        LOCAL
    }

    async fn is_compatible(&self, state: &TransferState) -> bool {
        if remote_url(&state.source).is_some() {
            return false;
        }
        fs::metadata(&state.source)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn setup_state(
        &self,
        mut state: TransferState,
        ctx: &SetupContext<'_>,
    ) -> Result<TransferState, ProcessorError> {
        let source = Path::new(&state.source);
        let meta = fs::metadata(source)
            .await
            .map_err(ProcessorError::io(source))?;

        state.total_bytes = meta.len();
        state.destination = ctx
            .destination
            .map(Path::to_path_buf)
            .unwrap_or_else(|| source.to_path_buf());
        state.temporary = false;
        Ok(state)
    }

    async fn copy(
        &self,
        state: &mut TransferState,
        budget: TimeBudget,
    ) -> Result<CopyStatus, ProcessorError> {
        let source = Path::new(&state.source).to_path_buf();
        let destination = state.destination.clone();

        if same_file(&source, &destination).await {
            state.total_bytes_copied = state.total_bytes;
            return Ok(CopyStatus::Done);
        }

        let offset = state.total_bytes_copied;
        let mut reader = File::open(&source)
            .await
            .map_err(ProcessorError::io(&source))?;
        reader
            .seek(SeekFrom::Start(offset))
            .await
            .map_err(ProcessorError::io(&source))?;
        let mut writer = open_for_resume(&destination, offset).await?;

        debug!(
            source = %source.display(),
            destination = %destination.display(),
            offset,
            chunk_size = %self.chunk_size,
            "Copying local file"
        );

        let mut buf = vec![0u8; self.chunk_size.as_usize()];
        let status = loop {
            let remaining = state.remaining();
            if remaining == 0 {
                break CopyStatus::Done;
            }

            let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
            let n = reader
                .read(&mut buf[..want])
                .await
                .map_err(ProcessorError::io(&source))?;
            if n == 0 {
                // source shrank after setup
                writer.flush().await.map_err(ProcessorError::io(&destination))?;
                return Err(ProcessorError::Incomplete {
                    copied: state.total_bytes_copied,
                    total: state.total_bytes,
                });
            }

            writer
                .write_all(&buf[..n])
                .await
                .map_err(ProcessorError::io(&destination))?;
            state.advance(n);

            if state.remaining() == 0 {
                break CopyStatus::Done;
            }
            if budget.is_exhausted() {
                break CopyStatus::Stopped;
            }
        };

        writer
            .flush()
            .await
            .map_err(ProcessorError::io(&destination))?;
        Ok(status)
    }
}
