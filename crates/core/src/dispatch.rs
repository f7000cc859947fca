//! Size-based dispatch policy: answer inline, defer to a background job, or
//! refuse.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Candidate;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Inputs at or below this are answered synchronously.
pub const DEFAULT_ASYNC_LIMIT: Candidate = 10_000_000;

/// Inputs above this are rejected outright.
pub const DEFAULT_COMPUTE_LIMIT: Candidate = 10_000_000_000;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Outcome of classifying a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispatch {
    /// Above the compute limit; too expensive to attempt.
    Reject,
    /// Cheap enough to compute inside the request.
    Sync,
    /// Compute out of band and hand the caller a job handle.
    Async,
}

/// The two thresholds that drive [`Dispatch`].
///
/// Invariant: `async_limit <= compute_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    async_limit: Candidate,
    compute_limit: Candidate,
}

impl DispatchPolicy {
    /// Build a policy, rejecting an async limit above the compute limit.
    pub fn new(async_limit: Candidate, compute_limit: Candidate) -> Result<Self, CoreError> {
        if async_limit > compute_limit {
            return Err(CoreError::Validation(format!(
                "ASYNC_LIMIT ({async_limit}) must not exceed COMPUTE_LIMIT ({compute_limit})"
            )));
        }
        Ok(Self {
            async_limit,
            compute_limit,
        })
    }

    pub fn async_limit(&self) -> Candidate {
        self.async_limit
    }

    pub fn compute_limit(&self) -> Candidate {
        self.compute_limit
    }

    /// Classify `n` against both thresholds.
    pub fn classify(&self, n: Candidate) -> Dispatch {
        if n > self.compute_limit {
            Dispatch::Reject
        } else if n > self.async_limit {
            Dispatch::Async
        } else {
            Dispatch::Sync
        }
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            async_limit: DEFAULT_ASYNC_LIMIT,
            compute_limit: DEFAULT_COMPUTE_LIMIT,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
