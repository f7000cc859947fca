use primer_core::error::CoreError;

/// Errors raised by [`JobStore`](crate::JobStore) implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A domain-level error (unknown handle, double completion, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Reading, writing or locking the backing file failed.
    #[error("Job store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file does not hold a valid job table.
    #[error("Job store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The blocking task that performed the file access did not finish.
    #[error("Job store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// True when the requested handle does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Core(CoreError::NotFound(_)))
    }
}
