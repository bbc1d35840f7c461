//! Transfer strategies
//!
//! A [`Processor`] knows how to move bytes for one kind of source. Every job
//! is bound to exactly one processor, picked by the [`ProcessorRegistry`] when
//! the job is constructed:
//!
//! - registered custom processors named by the job configuration, in order
//! - [`LocalProcessor`] for files on the local filesystem
//! - [`RangeProcessor`] for HTTP sources with a length and byte-range support
//! - [`FallbackProcessor`] for everything else, one uninterruptible pass
//!
//! Progress lives in a [`TransferState`], which is all a later run needs to
//! continue where the previous one stopped.

mod fallback;
mod local;
mod partial;
mod registry;
mod remote;
mod state;
mod traits;

pub use fallback::{FALLBACK, FallbackProcessor};
pub use local::{LOCAL, LocalProcessor, MAX_CHUNK_SIZE};
pub use registry::{ProcessorRegistry, RegistryError};
pub use remote::{RANGE, RangeProcessor};
pub use state::{CopyStatus, TimeBudget, TransferState};
pub use traits::{Processor, ProcessorError, SetupContext};
