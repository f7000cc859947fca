//! Job storage for deferred primality computations.
//!
//! [`JobStore`] is the only shared mutable resource in the service. Two
//! backends are provided:
//!
//! - [`InMemoryJobStore`] for a single process where the API and the runner
//!   share memory.
//! - [`FileJobStore`] for out-of-process workers that write results back
//!   into a shared JSON file.
//!
//! Both reserve handles with collision detection and route every completion
//! through [`JobRecord::complete`], so a record is only ever observed as
//! `PENDING` followed by `COMPLETE`.

use async_trait::async_trait;
use primer_core::error::CoreError;
use primer_core::job::{JobHandle, JobRecord};
use primer_core::types::Candidate;

pub mod error;
pub mod file;
pub mod memory;

pub use error::{StoreError, StoreResult};
pub use file::FileJobStore;
pub use memory::InMemoryJobStore;

/// How many fresh handles to try before giving up on a create.
pub const MAX_HANDLE_ATTEMPTS: usize = 16;

/// Source of candidate handles. Production stores use
/// [`JobHandle::generate`]; tests substitute deterministic sequences.
pub type HandleGenerator = fn() -> JobHandle;

/// Concurrency-safe storage of [`JobRecord`]s keyed by handle.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Reserve a fresh handle and persist a pending record for `input`.
    ///
    /// Concurrent calls never receive the same handle, and no reader sees
    /// the record before it is fully written.
    async fn create(&self, input: Candidate) -> StoreResult<JobRecord>;

    /// Look up a record strictly by handle.
    ///
    /// Returns [`CoreError::NotFound`] (wrapped) for unknown handles.
    async fn get(&self, handle: &JobHandle) -> StoreResult<JobRecord>;

    /// Mark the record complete with `result`.
    ///
    /// A second call for the same handle fails with
    /// [`CoreError::AlreadyComplete`] and leaves the stored record as it was.
    async fn complete(&self, handle: &JobHandle, result: bool) -> StoreResult<JobRecord>;

    /// All records still waiting for a result.
    async fn list_pending(&self) -> StoreResult<Vec<JobRecord>>;
}

/// Draw handles from `generate` until one is not `taken`.
///
/// Callers must hold whatever lock makes `taken` authoritative until the
/// returned handle has been inserted.
pub(crate) fn reserve_handle(
    generate: HandleGenerator,
    taken: impl Fn(&JobHandle) -> bool,
) -> StoreResult<JobHandle> {
    for attempt in 1..=MAX_HANDLE_ATTEMPTS {
        let handle = generate();
        if !taken(&handle) {
            return Ok(handle);
        }
        tracing::warn!(%handle, attempt, "Job handle collision, regenerating");
    }
    Err(CoreError::Internal(format!(
        "could not reserve a unique job handle after {MAX_HANDLE_ATTEMPTS} attempts"
    ))
    .into())
}
