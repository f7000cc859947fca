use crate::job::JobHandle;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Job {0} not found")]
    NotFound(JobHandle),

    #[error("Job {0} is already complete")]
    AlreadyComplete(JobHandle),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
