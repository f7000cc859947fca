use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use primer_core::error::CoreError;
use primer_core::job::{JobHandle, JobRecord};
use primer_core::types::Candidate;
use tokio::sync::RwLock;

use crate::{reserve_handle, HandleGenerator, JobStore, StoreResult};

/// Process-local job store.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared between the request handlers and the task runner. Creates and
/// completions take the write lock, so readers never observe a half-applied
/// change.
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobHandle, JobRecord>>,
    generate: HandleGenerator,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::with_handle_generator(JobHandle::generate)
    }

    pub fn with_handle_generator(generate: HandleGenerator) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            generate,
        }
    }

    /// Number of tracked records, pending or complete.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, input: Candidate) -> StoreResult<JobRecord> {
        let mut jobs = self.jobs.write().await;
        let handle = reserve_handle(self.generate, |h| jobs.contains_key(h))?;

        // The write guard is still held, so the reserved handle cannot have
        // been taken since `reserve_handle` checked it.
        let record = JobRecord::pending(handle.clone(), input, Utc::now());
        jobs.insert(handle, record.clone());

        tracing::debug!(handle = %record.handle, input, "Job created");
        Ok(record)
    }

    async fn get(&self, handle: &JobHandle) -> StoreResult<JobRecord> {
        self.jobs
            .read()
            .await
            .get(handle)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(handle.clone()).into())
    }

    async fn complete(&self, handle: &JobHandle, result: bool) -> StoreResult<JobRecord> {
        let mut jobs = self.jobs.write().await;
        let record = jobs
            .get_mut(handle)
            .ok_or_else(|| CoreError::NotFound(handle.clone()))?;

        record.complete(result, Utc::now())?;

        tracing::debug!(%handle, input = record.input, result, "Job completed");
        Ok(record.clone())
    }

    async fn list_pending(&self) -> StoreResult<Vec<JobRecord>> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|r| r.is_pending())
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
