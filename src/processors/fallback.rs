use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::partial::create_truncated;
use super::remote::parse_remote;
use super::state::{CopyStatus, TimeBudget, TransferState};
use super::traits::{Processor, ProcessorError, SetupContext};
use crate::http::{HttpClient, HttpError};

pub const FALLBACK: &str = "fallback";

/// Last resort: one uninterruptible GET of the whole body
///
/// Without range support there is no safe point to resume from, so this
/// processor ignores time budgets entirely and a run either finishes or fails.
#[derive(Debug, Clone)]
pub struct FallbackProcessor {
    client: Arc<HttpClient>,
}

impl FallbackProcessor {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Processor for FallbackProcessor {
    fn name(&self) -> &str {
        FALLBACK
    }

    fn supports_interruption(&self) -> bool {
        false
    }

    async fn is_compatible(&self, _state: &TransferState) -> bool {
        true
    }

    async fn setup_state(
        &self,
        mut state: TransferState,
        ctx: &SetupContext<'_>,
    ) -> Result<TransferState, ProcessorError> {
        match parse_remote(&state) {
            Ok(url) => {
                state.destination = ctx.remote_destination(&url, &state.temporary_directory);
                state.temporary = ctx.destination.is_none();
            }
            // nothing else claimed it; the run will report the bad source
            Err(_) => {
                if let Some(destination) = ctx.destination {
                    state.destination = destination.to_path_buf();
                }
                state.temporary = false;
            }
        }
        state.total_bytes = 0;
        Ok(state)
    }

    async fn copy(
        &self,
        state: &mut TransferState,
        budget: TimeBudget,
    ) -> Result<CopyStatus, ProcessorError> {
        if state.total_bytes_copied > 0 {
            return Err(ProcessorError::NotRestartable(FALLBACK.to_string()));
        }
        if let Some(limit) = budget.limit() {
            warn!(?limit, "Ignoring time budget for uninterruptible transfer");
        }

        let url = parse_remote(state)?;
        let destination = state.destination.clone();

        let mut response = self.client.get(&url).await?;
        let expected = response.content_length();
        let mut file = create_truncated(&destination).await?;

        let outcome = async {
            while let Some(chunk) = response.chunk().await.map_err(HttpError::from)? {
                file.write_all(&chunk)
                    .await
                    .map_err(ProcessorError::io(&destination))?;
                state.advance(chunk.len());
            }
            Ok::<(), ProcessorError>(())
        }
        .await;

        let flushed = file.flush().await.map_err(ProcessorError::io(&destination));
        outcome?;
        flushed?;

        if let Some(expected) = expected.filter(|e| *e != state.total_bytes_copied) {
            return Err(ProcessorError::Incomplete {
                copied: state.total_bytes_copied,
                total: expected,
            });
        }

        state.total_bytes = state.total_bytes_copied;
        info!(%url, bytes = state.total_bytes, "Full-body download complete");
        Ok(CopyStatus::Done)
    }
}
