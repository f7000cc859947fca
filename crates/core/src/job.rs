//! Asynchronous job records and their handles.
//!
//! A [`JobRecord`] is created `Pending` and moves to `Complete` exactly
//! once. The transition lives here so every store backend enforces the same
//! rule.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Candidate, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of alphanumeric characters in a generated handle.
pub const HANDLE_LENGTH: usize = 12;

/// Status message shown while a job is still running.
pub const MSG_PROCESSING: &str = "processing";

/// Status message shown once a job has a result.
pub const MSG_COMPLETE: &str = "complete";

// ---------------------------------------------------------------------------
// JobHandle
// ---------------------------------------------------------------------------

/// Opaque lookup token handed to the caller for a deferred computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    /// Generate a fresh random handle of [`HANDLE_LENGTH`] characters drawn
    /// from `[A-Za-z0-9]`.
    ///
    /// Uniqueness is not guaranteed here; stores check for collisions when
    /// reserving the handle.
    pub fn generate() -> Self {
        let handle: String = rand::rng()
            .sample_iter(&rand::distr::Alphanumeric)
            .take(HANDLE_LENGTH)
            .map(char::from)
            .collect();
        Self(handle)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Complete,
}

impl JobStatus {
    /// Human-readable status used in poll responses.
    pub fn message(self) -> &'static str {
        match self {
            Self::Pending => MSG_PROCESSING,
            Self::Complete => MSG_COMPLETE,
        }
    }
}

// ---------------------------------------------------------------------------
// JobRecord
// ---------------------------------------------------------------------------

/// One asynchronous primality job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub handle: JobHandle,
    /// The integer under test. Fixed for the lifetime of the record.
    pub input: Candidate,
    pub status: JobStatus,
    /// Only meaningful once `status` is `Complete`.
    pub result: Option<bool>,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl JobRecord {
    /// A new pending record with no result.
    pub fn pending(handle: JobHandle, input: Candidate, now: Timestamp) -> Self {
        Self {
            handle,
            input,
            status: JobStatus::Pending,
            result: None,
            created_at: now,
            completed_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == JobStatus::Pending
    }

    /// Apply the single `Pending -> Complete` transition.
    ///
    /// A record that is already complete is left untouched and
    /// [`CoreError::AlreadyComplete`] is returned, whatever `result` is.
    pub fn complete(&mut self, result: bool, now: Timestamp) -> Result<(), CoreError> {
        if self.status == JobStatus::Complete {
            return Err(CoreError::AlreadyComplete(self.handle.clone()));
        }
        self.status = JobStatus::Complete;
        self.result = Some(result);
        self.completed_at = Some(now);
        Ok(())
    }

    /// Whether this record has been pending for longer than `max_age`.
    ///
    /// Complete records are never stale.
    pub fn is_stale(&self, now: Timestamp, max_age: chrono::Duration) -> bool {
        self.is_pending() && now - self.created_at > max_age
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    #[test]
    fn generated_handle_has_expected_shape() {
        let handle = JobHandle::generate();

        assert_eq!(handle.as_str().len(), HANDLE_LENGTH);
        assert!(handle.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_handles_differ() {
        let handles: HashSet<JobHandle> = (0..1_000).map(|_| JobHandle::generate()).collect();
        assert_eq!(handles.len(), 1_000);
    }

    #[test]
    fn new_record_is_pending_without_result() {
        let record = JobRecord::pending("abc".into(), 11, Utc::now());

        assert!(record.is_pending());
        assert_eq!(record.result, None);
        assert_eq!(record.completed_at, None);
        assert_eq!(record.status.message(), MSG_PROCESSING);
    }

    #[test]
    fn complete_sets_status_and_result() {
        let mut record = JobRecord::pending("abc".into(), 11, Utc::now());

        record.complete(true, Utc::now()).unwrap();

        assert_eq!(record.status, JobStatus::Complete);
        assert_eq!(record.result, Some(true));
        assert!(record.completed_at.is_some());
        assert_eq!(record.status.message(), MSG_COMPLETE);
    }

    #[test]
    fn second_complete_is_rejected_and_keeps_first_result() {
        let mut record = JobRecord::pending("abc".into(), 11, Utc::now());
        record.complete(true, Utc::now()).unwrap();
        let first = record.clone();

        assert_matches!(
            record.complete(false, Utc::now()),
            Err(CoreError::AlreadyComplete(h)) if h.as_str() == "abc"
        );
        assert_eq!(record, first);
    }

    #[test]
    fn staleness_only_applies_to_old_pending_records() {
        let created = Utc::now() - chrono::Duration::hours(2);
        let mut record = JobRecord::pending("old".into(), 4, created);
        let max_age = chrono::Duration::hours(1);

        assert!(record.is_stale(Utc::now(), max_age));
        assert!(!record.is_stale(created, max_age));

        record.complete(false, Utc::now()).unwrap();
        assert!(!record.is_stale(Utc::now(), max_age));
    }

    #[test]
    fn status_serializes_in_upper_case() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Complete).unwrap(),
            "\"COMPLETE\""
        );
    }

    #[test]
    fn handle_serializes_as_plain_string() {
        let handle = JobHandle::from("Xy12");
        assert_eq!(serde_json::to_string(&handle).unwrap(), "\"Xy12\"");
    }
}
