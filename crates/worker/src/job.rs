use primer_core::job::{JobHandle, JobRecord};
use primer_core::primality::is_prime;
use primer_core::types::Candidate;
use primer_store::JobStore;

use crate::RunnerError;

/// Compute `input` and complete `handle` with the answer.
///
/// The stored record must have been created for `input`; a job is never
/// allowed to resolve a handle that belongs to another number. The trial
/// division runs on the blocking pool.
pub async fn run_job(
    store: &dyn JobStore,
    handle: &JobHandle,
    input: Candidate,
) -> Result<JobRecord, RunnerError> {
    let record = store.get(handle).await?;
    if record.input != input {
        return Err(RunnerError::InputMismatch {
            handle: handle.clone(),
            stored: record.input,
            requested: input,
        });
    }

    let started = std::time::Instant::now();
    let result = tokio::task::spawn_blocking(move || is_prime(input)).await?;
    tracing::debug!(
        %handle,
        input,
        result,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Primality computed"
    );

    Ok(store.complete(handle, result).await?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
