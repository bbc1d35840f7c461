//! Persistence for fetch jobs
//!
//! A job writes its [`JobRecord`] after construction and around every run; a
//! later process hydrates the job from that record to continue the transfer.
//! The engine takes no locks: callers must not run the same job id from two
//! places at once.

mod error;
mod fjall_store;

pub use fjall_store::FjallStore;
pub use error::{Result, StoreError};

use std::collections::HashMap;
use std::sync::RwLock;

use crate::job::JobRecord;

/// Storage backend for job records, keyed by job id
pub trait JobStore: Send + Sync {
    fn load(&self, job_id: &str) -> Result<Option<JobRecord>>;

    fn save(&self, job_id: &str, record: &JobRecord) -> Result<()>;

    fn remove(&self, job_id: &str) -> Result<()>;
}

/// In-process store, mostly for tests and one-shot use
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, JobRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobStore for MemoryStore {
    fn load(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(job_id).cloned())
    }

    fn save(&self, job_id: &str, record: &JobRecord) -> Result<()> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        records.insert(job_id.to_string(), record.clone());
        Ok(())
    }

    fn remove(&self, job_id: &str) -> Result<()> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        records.remove(job_id);
        Ok(())
    }
}
