use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::partial::open_for_resume;
use super::state::{CopyStatus, TimeBudget, TransferState};
use super::traits::{Processor, ProcessorError, SetupContext};
use crate::http::{ContentRange, HttpClient, HttpError, remote_url};

pub const RANGE: &str = "range";

/// Downloads from servers that report a length and serve byte ranges
///
/// Each run issues a single `Range: bytes=<copied>-` request and appends to the
/// partial file until the body ends or the budget runs out. Dropping the
/// response mid-body is the stop mechanism; the next run asks for the rest.
#[derive(Debug, Clone)]
pub struct RangeProcessor {
    client: Arc<HttpClient>,
}

impl RangeProcessor {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Reject responses that would not continue the file at `offset`
    fn check_response(
        &self,
        response: &Response,
        state: &TransferState,
    ) -> Result<(), ProcessorError> {
        let offset = state.total_bytes_copied;
        match response.status() {
            StatusCode::PARTIAL_CONTENT => {
                let range = ContentRange::from_headers(response.headers()).ok_or_else(|| {
                    ProcessorError::MalformedResponse(
                        "206 response without a usable Content-Range".to_string(),
                    )
                })?;
                if range.start != offset {
                    return Err(ProcessorError::MalformedResponse(format!(
                        "requested bytes from {} but server sent from {}",
                        offset, range.start
                    )));
                }
                if range.total.is_some_and(|total| total != state.total_bytes) {
                    return Err(ProcessorError::SourceChanged);
                }
                Ok(())
            }
            StatusCode::OK if offset == 0 => Ok(()),
            // If-Range mismatch: the server fell back to the full, new entity
            StatusCode::OK if state.validator.is_some() => Err(ProcessorError::SourceChanged),
            StatusCode::OK => Err(ProcessorError::MalformedResponse(format!(
                "server ignored range request at offset {}",
                offset
            ))),
            status => Err(HttpError::from_status(status).into()),
        }
    }

    /// Append body chunks until the body ends, the total is reached or time is up
    async fn pump(
        &self,
        response: &mut Response,
        file: &mut File,
        destination: &Path,
        state: &mut TransferState,
        budget: TimeBudget,
    ) -> Result<CopyStatus, ProcessorError> {
        while let Some(chunk) = response.chunk().await.map_err(HttpError::from)? {
            if chunk.len() as u64 > state.remaining() {
                return Err(ProcessorError::MalformedResponse(format!(
                    "body exceeds advertised length of {} bytes",
                    state.total_bytes
                )));
            }

            file.write_all(&chunk)
                .await
                .map_err(ProcessorError::io(destination))?;
            state.advance(chunk.len());

            if state.is_complete() {
                return Ok(CopyStatus::Done);
            }
            if budget.is_exhausted() {
                return Ok(CopyStatus::Stopped);
            }
        }

        if state.is_complete() {
            Ok(CopyStatus::Done)
        } else {
            Err(ProcessorError::Incomplete {
                copied: state.total_bytes_copied,
                total: state.total_bytes,
            })
        }
    }
}

pub(crate) fn parse_remote(state: &TransferState) -> Result<Url, ProcessorError> {
    remote_url(&state.source).ok_or_else(|| ProcessorError::InvalidUrl(state.source.clone()))
}

#[async_trait]
impl Processor for RangeProcessor {
    fn name(&self) -> &str {
        RANGE
    }

    async fn is_compatible(&self, state: &TransferState) -> bool {
        match remote_url(&state.source) {
            Some(url) => self.client.probe(&url).await.is_some(),
            None => false,
        }
    }

    async fn setup_state(
        &self,
        mut state: TransferState,
        ctx: &SetupContext<'_>,
    ) -> Result<TransferState, ProcessorError> {
        let url = parse_remote(&state)?;
        let meta = self
            .client
            .probe(&url)
            .await
            .ok_or_else(|| ProcessorError::Unsupported {
                processor: RANGE.to_string(),
                source_id: state.source.clone(),
            })?;

        state.total_bytes = meta.content_length;
        state.validator = meta.validator;
        state.destination = ctx.remote_destination(&url, &state.temporary_directory);
        state.temporary = ctx.destination.is_none();
        Ok(state)
    }

    async fn copy(
        &self,
        state: &mut TransferState,
        budget: TimeBudget,
    ) -> Result<CopyStatus, ProcessorError> {
        if state.is_complete() {
            return Ok(CopyStatus::Done);
        }

        let url = parse_remote(state)?;
        let destination = state.destination.clone();
        let offset = state.total_bytes_copied;
        let mut file = open_for_resume(&destination, offset).await?;

        let mut response = self
            .client
            .get_range(&url, offset, state.validator.as_deref())
            .await?;
        self.check_response(&response, state)?;

        let outcome = self
            .pump(&mut response, &mut file, &destination, state, budget)
            .await;
        drop(response);

        // written bytes are counted, so they must reach the file even on error
        let flushed = file.flush().await.map_err(ProcessorError::io(&destination));
        let status = outcome?;
        flushed?;

        match status {
            CopyStatus::Done => info!(%url, bytes = state.total_bytes_copied, "Ranged download complete"),
            CopyStatus::Stopped => debug!(
                %url,
                offset = state.total_bytes_copied,
                total = state.total_bytes,
                "Time budget exhausted, stopping ranged download"
            ),
        }
        Ok(status)
    }
}
