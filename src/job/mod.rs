//! Fetch jobs: construction, time-boxed runs and hydration
//!
//! ```rust,ignore
//! use filefetch::job::{FetchConfig, FetchJob};
//! use filefetch::processors::ProcessorRegistry;
//! use filefetch::store::MemoryStore;
//!
//! let registry = ProcessorRegistry::with_defaults()?;
//! let store = Arc::new(MemoryStore::new());
//! let config = FetchConfig::for_source("https://example.com/data.csv");
//!
//! let mut job = FetchJob::get("1", store, Some(config), &registry).await?;
//! job.set_time_limit(Duration::from_secs(30));
//! let result = job.run().await?;
//! ```

mod config;
mod error;
mod fetcher;
mod result;

pub use self::config::{ConfigError, FetchConfig, validate};
pub use error::{JobError, Result};
pub use fetcher::FetchJob;
pub use result::{JobRecord, JobResult, JobStatus};
