use primer_core::job::JobHandle;
use primer_core::types::Candidate;
use primer_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Reading or completing the job record failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The record behind `handle` was created for a different input.
    #[error("Job {handle} was created for {stored}, refusing to resolve it with {requested}")]
    InputMismatch {
        handle: JobHandle,
        stored: Candidate,
        requested: Candidate,
    },

    /// The computation task panicked or was aborted.
    #[error("Primality computation did not finish: {0}")]
    Computation(#[from] tokio::task::JoinError),

    /// The worker process could not be launched.
    #[error("Failed to launch worker {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}
