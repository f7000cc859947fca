use std::path::PathBuf;
use std::process::Stdio;

use primer_core::job::JobHandle;
use primer_core::types::Candidate;
use tokio::process::Command;

use crate::{JobRunner, RunnerError};

/// Default worker executable, resolved through `PATH`.
pub const DEFAULT_WORKER_BIN: &str = "primer-worker";

/// Runs each job in a separate `primer-worker` process.
///
/// The worker is told which handle to complete and which job file to write
/// to; it must share that file with the API's
/// [`FileJobStore`](primer_store::FileJobStore).
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    store_path: PathBuf,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>, store_path: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            store_path: store_path.into(),
        }
    }

    fn command(&self, handle: &JobHandle, input: Candidate) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--key")
            .arg(handle.as_str())
            .arg("--store")
            .arg(&self.store_path)
            .arg("--")
            .arg(input.to_string())
            .stdin(Stdio::null());
        cmd
    }
}

impl JobRunner for ProcessRunner {
    fn spawn(&self, handle: JobHandle, input: Candidate) -> Result<(), RunnerError> {
        let mut child = self
            .command(&handle, input)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        tracing::debug!(%handle, input, pid = child.id(), "Worker process started");

        // Reap the child so it does not linger as a zombie.
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    tracing::debug!(%handle, "Worker process exited cleanly");
                }
                Ok(status) => {
                    tracing::error!(%handle, code = ?status.code(), "Worker process failed, record left pending");
                }
                Err(e) => {
                    tracing::error!(%handle, error = %e, "Failed to wait on worker process");
                }
            }
        });

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
