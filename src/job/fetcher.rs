use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::config::{FetchConfig, validate};
use super::error::{JobError, Result};
use super::result::{JobRecord, JobResult, JobStatus};
use crate::processors::{
    CopyStatus, Processor, ProcessorRegistry, SetupContext, TimeBudget, TransferState,
};
use crate::store::JobStore;

/// A resumable copy of one source to one destination
///
/// The processor is chosen once, when the job is constructed, and is recorded
/// in the transfer state. Each [`run`](FetchJob::run) is a single time-boxed
/// attempt; the job record is written to the store before and after it.
pub struct FetchJob {
    id: String,
    store: Arc<dyn JobStore>,
    processor: Arc<dyn Processor>,
    state: TransferState,
    result: JobResult,
    time_limit: Option<Duration>,
}

impl fmt::Debug for FetchJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchJob")
            .field("id", &self.id)
            .field("processor", &self.processor.name())
            .field("state", &self.state)
            .field("status", &self.result.status)
            .field("time_limit", &self.time_limit)
            .finish()
    }
}

impl FetchJob {
    /// Load the job stored under `id`, or construct and store a new one
    ///
    /// `config` is only consulted when no record exists yet.
    pub async fn get(
        id: impl Into<String>,
        store: Arc<dyn JobStore>,
        config: Option<FetchConfig>,
        registry: &ProcessorRegistry,
    ) -> Result<Self> {
        let id = id.into();
        if let Some(record) = store.load(&id)? {
            debug!(job_id = %id, "Hydrating stored job");
            return Self::hydrate(id, store, record, registry);
        }

        let job = Self::construct(id, store, config, registry).await?;
        job.save()?;
        Ok(job)
    }

    /// Build a fresh job: validate, select a processor, lay out the state
    ///
    /// Nothing is written to the store here; [`get`](FetchJob::get) does that.
    pub async fn construct(
        id: impl Into<String>,
        store: Arc<dyn JobStore>,
        config: Option<FetchConfig>,
        registry: &ProcessorRegistry,
    ) -> Result<Self> {
        let id = id.into();
        let (source, config) = validate(config)?;

        let state = TransferState::new(source, config.temporary_directory.clone());
        let ctx = SetupContext {
            destination: config.destination.as_deref(),
            keep_original_filename: config.keep_original_filename,
            naming: registry.naming(),
        };
        let (processor, state) = registry.bind(state, &config.processors, &ctx).await?;

        info!(
            job_id = %id,
            processor = %state.processor,
            destination = %state.destination.display(),
            total_bytes = state.total_bytes,
            "Fetch job constructed"
        );

        let result = JobResult::new(JobStatus::Stopped, state.encode()?, None);
        Ok(Self {
            id,
            store,
            processor,
            state,
            result,
            time_limit: None,
        })
    }

    /// Rebuild a job from its persisted record
    ///
    /// The processor named in the stored state is authoritative; selection is
    /// not repeated.
    pub fn hydrate(
        id: impl Into<String>,
        store: Arc<dyn JobStore>,
        record: JobRecord,
        registry: &ProcessorRegistry,
    ) -> Result<Self> {
        let state = TransferState::decode(&record.result.data)?;
        let processor = registry
            .get(&state.processor)
            .ok_or_else(|| JobError::UnknownProcessor(state.processor.clone()))?;

        let time_limit = record
            .time_limit
            .filter(|_| processor.supports_interruption());

        Ok(Self {
            id: id.into(),
            store,
            processor,
            state,
            result: record.result,
            time_limit,
        })
    }

    /// Limit how long each run may spend copying
    ///
    /// Rejected (returns false, nothing changes) when the bound processor
    /// cannot stop part-way.
    pub fn set_time_limit(&mut self, limit: Duration) -> bool {
        if !self.processor.supports_interruption() {
            debug!(job_id = %self.id, processor = self.processor.name(), "Time limit rejected");
            return false;
        }
        self.time_limit = Some(limit);
        true
    }

    pub fn clear_time_limit(&mut self) {
        self.time_limit = None;
    }

    /// Perform one time-boxed copy attempt
    ///
    /// A finished job returns its stored result without touching anything.
    /// A failed job that already counted bytes is retried only if its
    /// processor can resume, since a restart would transfer them again.
    pub async fn run(&mut self) -> Result<JobResult> {
        match self.result.status {
            JobStatus::Done => return Ok(self.result.clone()),
            JobStatus::Error
                if !self.processor.supports_interruption()
                    && self.state.total_bytes_copied > 0 =>
            {
                warn!(job_id = %self.id, processor = self.processor.name(), "Not retrying failed job");
                return Ok(self.result.clone());
            }
            _ => {}
        }

        self.result = JobResult::new(JobStatus::Running, self.state.encode()?, None);
        self.save()?;

        let budget = TimeBudget::start(self.time_limit);
        let copied_before = self.state.total_bytes_copied;
        let outcome = self.processor.copy(&mut self.state, budget).await;
        debug_assert!(self.state.total_bytes_copied >= copied_before);

        let data = self.state.encode()?;
        self.result = match outcome {
            Ok(CopyStatus::Done) => {
                info!(
                    job_id = %self.id,
                    bytes = self.state.total_bytes_copied,
                    elapsed_ms = budget.elapsed().as_millis() as u64,
                    "Fetch complete"
                );
                JobResult::new(JobStatus::Done, data, None)
            }
            Ok(CopyStatus::Stopped) => {
                info!(
                    job_id = %self.id,
                    copied = self.state.total_bytes_copied,
                    total = self.state.total_bytes,
                    "Fetch stopped, time limit reached"
                );
                JobResult::new(JobStatus::Stopped, data, None)
            }
            Err(e) => {
                warn!(
                    job_id = %self.id,
                    copied = self.state.total_bytes_copied,
                    error = %e,
                    "Fetch failed"
                );
                JobResult::new(JobStatus::Error, data, Some(e.to_string()))
            }
        };

        self.save()?;
        Ok(self.result.clone())
    }

    /// Snapshot suitable for [`hydrate`](FetchJob::hydrate)
    pub fn to_record(&self) -> JobRecord {
        JobRecord::new(self.time_limit, self.result.clone())
    }

    fn save(&self) -> Result<()> {
        self.store.save(&self.id, &self.to_record())?;
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &TransferState {
        &self.state
    }

    pub fn result(&self) -> &JobResult {
        &self.result
    }

    pub fn status(&self) -> JobStatus {
        self.result.status
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn processor_name(&self) -> &str {
        self.processor.name()
    }

    pub fn supports_time_limit(&self) -> bool {
        self.processor.supports_interruption()
    }

    pub fn source(&self) -> &str {
        &self.state.source
    }

    pub fn destination(&self) -> &Path {
        &self.state.destination
    }

    pub fn is_temporary(&self) -> bool {
        self.state.temporary
    }

    pub fn total_bytes(&self) -> u64 {
        self.state.total_bytes
    }

    pub fn total_bytes_copied(&self) -> u64 {
        self.state.total_bytes_copied
    }
}
