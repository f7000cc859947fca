use std::sync::Arc;

use primer_core::job::JobHandle;
use primer_core::types::Candidate;
use primer_store::JobStore;
use tracing::Instrument;

use crate::{run_job, JobRunner, RunnerError};

/// Runs jobs as tokio tasks inside the current process.
///
/// Must be used from within a tokio runtime.
#[derive(Clone)]
pub struct TaskRunner {
    store: Arc<dyn JobStore>,
}

impl TaskRunner {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }
}

impl JobRunner for TaskRunner {
    fn spawn(&self, handle: JobHandle, input: Candidate) -> Result<(), RunnerError> {
        let store = Arc::clone(&self.store);
        let span = tracing::info_span!("job", %handle, input);

        tokio::spawn(
            async move {
                match run_job(store.as_ref(), &handle, input).await {
                    Ok(record) => {
                        tracing::info!(result = ?record.result, "Job complete");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Job failed, record left pending");
                    }
                }
            }
            .instrument(span),
        );

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use primer_core::job::{JobRecord, JobStatus};
    use primer_core::primality::is_prime;
    use primer_store::InMemoryJobStore;

    use super::*;

    async fn wait_for_complete(store: &dyn JobStore, handle: &JobHandle) -> JobRecord {
        for _ in 0..500 {
            let record = store.get(handle).await.unwrap();
            if record.status == JobStatus::Complete {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {handle} did not complete in time");
    }

    #[tokio::test]
    async fn spawn_returns_before_completion_then_completes() {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let runner = TaskRunner::new(Arc::clone(&store));
        let record = store.create(1_299_827).await.unwrap();

        runner.spawn(record.handle.clone(), 1_299_827).unwrap();

        let done = wait_for_complete(store.as_ref(), &record.handle).await;
        assert_eq!(done.result, Some(true));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_jobs_resolve_their_own_handles() {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let runner = TaskRunner::new(Arc::clone(&store));

        let inputs = [1_297_799, 123_456, 1_299_821, 30_030];
        let mut records = Vec::new();
        for input in inputs {
            let record = store.create(input).await.unwrap();
            runner.spawn(record.handle.clone(), input).unwrap();
            records.push(record);
        }

        for record in &records {
            let done = wait_for_complete(store.as_ref(), &record.handle).await;
            assert_eq!(done.input, record.input);
            assert_eq!(done.result, Some(is_prime(record.input)));
        }
    }

    #[tokio::test]
    async fn mismatched_input_leaves_record_pending() {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let runner = TaskRunner::new(Arc::clone(&store));
        let record = store.create(15).await.unwrap();

        runner.spawn(record.handle.clone(), 17).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(store.get(&record.handle).await.unwrap().is_pending());
    }
}
