use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use primer_core::dispatch::{DispatchPolicy, DEFAULT_ASYNC_LIMIT, DEFAULT_COMPUTE_LIMIT};
use primer_core::types::Candidate;
use primer_store::file::DEFAULT_STORE_PATH;
use primer_worker::process::DEFAULT_WORKER_BIN;

/// Configuration values that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Where job records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local map.
    Memory,
    /// Shared JSON file at the given path.
    File(PathBuf),
}

/// How deferred jobs are executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerKind {
    /// Tokio task in the API process.
    Task,
    /// One `primer-worker` process per job.
    Process { program: PathBuf },
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for background tasks on shutdown (default: `5`).
    pub shutdown_timeout_secs: u64,
    /// Sync/async/reject thresholds.
    pub policy: DispatchPolicy,
    pub store: StoreBackend,
    pub runner: RunnerKind,
    /// Pending jobs older than this are reported by the stale-job monitor.
    pub stale_job_secs: u64,
    /// How often the stale-job monitor runs.
    pub stale_job_check_secs: u64,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `5`                     |
    /// | `ASYNC_LIMIT`           | `10000000`              |
    /// | `COMPUTE_LIMIT`         | `10000000000`           |
    /// | `JOB_STORE`             | `memory` (or `file`)    |
    /// | `JOB_STORE_PATH`        | `async_results.json`    |
    /// | `JOB_RUNNER`            | `task` (or `process`)   |
    /// | `WORKER_BIN`            | `primer-worker`         |
    /// | `STALE_JOB_SECS`        | `3600`                  |
    /// | `STALE_JOB_CHECK_SECS`  | `60`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_var(&lookup, "PORT", 3000)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;
        let shutdown_timeout_secs: u64 = parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS", 5)?;

        let async_limit: Candidate = parse_var(&lookup, "ASYNC_LIMIT", DEFAULT_ASYNC_LIMIT)?;
        let compute_limit: Candidate =
            parse_var(&lookup, "COMPUTE_LIMIT", DEFAULT_COMPUTE_LIMIT)?;
        let policy =
            DispatchPolicy::new(async_limit, compute_limit).map_err(|e| ConfigError::Invalid {
                var: "ASYNC_LIMIT",
                value: async_limit.to_string(),
                reason: e.to_string(),
            })?;

        let store_path =
            PathBuf::from(lookup("JOB_STORE_PATH").unwrap_or_else(|| DEFAULT_STORE_PATH.into()));
        let store = match lookup("JOB_STORE").as_deref() {
            None | Some("memory") => StoreBackend::Memory,
            Some("file") => StoreBackend::File(store_path),
            Some(other) => return Err(invalid("JOB_STORE", other, "expected `memory` or `file`")),
        };

        let runner = match lookup("JOB_RUNNER").as_deref() {
            None | Some("task") => RunnerKind::Task,
            Some("process") => RunnerKind::Process {
                program: PathBuf::from(
                    lookup("WORKER_BIN").unwrap_or_else(|| DEFAULT_WORKER_BIN.into()),
                ),
            },
            Some(other) => return Err(invalid("JOB_RUNNER", other, "expected `task` or `process`")),
        };

        if matches!(runner, RunnerKind::Process { .. }) && store == StoreBackend::Memory {
            return Err(invalid(
                "JOB_RUNNER",
                "process",
                "worker processes need JOB_STORE=file to report results",
            ));
        }

        let stale_job_secs: u64 = parse_var(&lookup, "STALE_JOB_SECS", 3600)?;
        let stale_job_check_secs: u64 = parse_var(&lookup, "STALE_JOB_CHECK_SECS", 60)?;
        if stale_job_check_secs == 0 {
            return Err(invalid("STALE_JOB_CHECK_SECS", "0", "must be positive"));
        }

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            policy,
            store,
            runner,
            stale_job_secs,
            stale_job_check_secs,
        })
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
