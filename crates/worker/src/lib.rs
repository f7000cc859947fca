//! Out-of-band execution of deferred primality jobs.
//!
//! A [`JobRunner`] is handed a `(handle, input)` pair, returns immediately,
//! and later resolves that handle (and only that handle) through
//! [`JobStore::complete`](primer_store::JobStore::complete).
//!
//! - [`TaskRunner`] computes on the tokio blocking pool inside the API
//!   process and writes to any [`JobStore`](primer_store::JobStore).
//! - [`ProcessRunner`] launches the `primer-worker` binary, which writes the
//!   result into a shared [`FileJobStore`](primer_store::FileJobStore).
//!
//! There is no cancellation and no retry. If a runner dies before calling
//! `complete`, the record stays pending; see the API's stale-job monitor.

use primer_core::job::JobHandle;
use primer_core::types::Candidate;

pub mod error;
pub mod job;
pub mod process;
pub mod task;

pub use error::RunnerError;
pub use job::run_job;
pub use process::ProcessRunner;
pub use task::TaskRunner;

/// Capability to start a job without waiting for it.
pub trait JobRunner: Send + Sync {
    /// Start computing `input` and arrange for `handle` to be completed.
    ///
    /// An `Err` means the job was never started; the record it was meant
    /// for is left pending.
    fn spawn(&self, handle: JobHandle, input: Candidate) -> Result<(), RunnerError>;
}
