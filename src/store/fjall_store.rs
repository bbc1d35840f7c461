use std::path::Path;

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::{debug, info};

use super::JobStore;
use super::error::{Result, StoreError};
use crate::job::JobRecord;

const JOB_PREFIX: &str = "job:";

/// Encode a job key: job:{job_id}
fn encode_job_key(job_id: &str) -> Vec<u8> {
    format!("{}{}", JOB_PREFIX, job_id).into_bytes()
}

/// Decode a job key: job:{job_id} -> job_id
fn decode_job_key(key: &[u8]) -> Option<String> {
    let key_str = std::str::from_utf8(key).ok()?;
    key_str.strip_prefix(JOB_PREFIX).map(String::from)
}

/// Fjall-backed job records, one JSON value per job id
#[derive(Clone)]
pub struct FjallStore {
    keyspace: Keyspace,
    jobs: PartitionHandle,
}

impl FjallStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening job store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let jobs = keyspace.open_partition("jobs", PartitionCreateOptions::default())?;

        Ok(Self { keyspace, jobs })
    }

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }

    /// Ids of every stored job, in key order
    pub fn ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for item in self.jobs.prefix(JOB_PREFIX) {
            let (key, _) = item?;
            let id = decode_job_key(&key)
                .ok_or_else(|| StoreError::InvalidKey(String::from_utf8_lossy(&key).into_owned()))?;
            ids.push(id);
        }
        Ok(ids)
    }
}

impl JobStore for FjallStore {
    fn load(&self, job_id: &str) -> Result<Option<JobRecord>> {
        match self.jobs.get(encode_job_key(job_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn save(&self, job_id: &str, record: &JobRecord) -> Result<()> {
        let value = serde_json::to_vec(record)?;
        self.jobs.insert(encode_job_key(job_id), value)?;
        debug!(job_id, status = ?record.result.status, "Saved job record");
        Ok(())
    }

    fn remove(&self, job_id: &str) -> Result<()> {
        self.jobs.remove(encode_job_key(job_id))?;
        debug!(job_id, "Removed job record");
        Ok(())
    }
}
