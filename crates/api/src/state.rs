use std::sync::Arc;

use primer_core::dispatch::DispatchPolicy;
use primer_store::{FileJobStore, InMemoryJobStore, JobStore, StoreResult};
use primer_worker::{JobRunner, ProcessRunner, TaskRunner};

use crate::config::{RunnerKind, ServerConfig, StoreBackend};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is `Copy`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Sync/async/reject thresholds.
    pub policy: DispatchPolicy,
    /// Storage for deferred jobs.
    pub store: Arc<dyn JobStore>,
    /// Starts deferred jobs.
    pub runner: Arc<dyn JobRunner>,
}

impl AppState {
    /// Build the store and runner selected by `config`.
    ///
    /// A file store is opened (and created if missing) here so that an
    /// unreadable job file fails startup rather than the first request.
    pub async fn from_config(config: ServerConfig) -> StoreResult<Self> {
        let store: Arc<dyn JobStore> = match &config.store {
            StoreBackend::Memory => Arc::new(InMemoryJobStore::new()),
            StoreBackend::File(path) => Arc::new(FileJobStore::open(path.clone()).await?),
        };

        let runner: Arc<dyn JobRunner> = match (&config.runner, &config.store) {
            (RunnerKind::Process { program }, StoreBackend::File(path)) => {
                Arc::new(ProcessRunner::new(program.clone(), path.clone()))
            }
            _ => Arc::new(TaskRunner::new(Arc::clone(&store))),
        };

        Ok(Self {
            policy: config.policy,
            config: Arc::new(config),
            store,
            runner,
        })
    }
}
