//! The response envelope shared by every outcome of the prime endpoint.
//!
//! Every branch, including internal failures, serializes to
//! `{ "result": bool | null, "error": bool, "message": string | null }`
//! plus `key` / `n` where a job handle is involved. Use the constructors
//! here rather than building the struct by hand.

use primer_core::job::{JobHandle, JobRecord};
use primer_core::types::Candidate;
use serde::Serialize;

/// Standard prime endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimeResponse {
    pub result: Option<bool>,
    pub error: bool,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<JobHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<Candidate>,
}

impl PrimeResponse {
    /// Inline answer: `{result, error: false, message: null}`.
    pub fn answer(result: bool) -> Self {
        Self {
            result: Some(result),
            error: false,
            message: None,
            key: None,
            n: None,
        }
    }

    /// Any failure: `{result: null, error: true, message}`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: true,
            message: Some(message.into()),
            key: None,
            n: None,
        }
    }

    /// A job was created; the caller should poll with `key`.
    pub fn deferred(n: Candidate, key: JobHandle) -> Self {
        Self {
            result: None,
            error: false,
            message: Some(format!(
                "{n} was too big to calculate immediately. You can request this result by \
                 appending ?key={key} to this API endpoint and receive a status or the \
                 eventual answer."
            )),
            key: Some(key),
            n: None,
        }
    }

    /// Current state of a job: `processing` or `complete`.
    pub fn job_status(record: JobRecord) -> Self {
        Self {
            result: record.result,
            error: false,
            message: Some(record.status.message().to_string()),
            key: Some(record.handle),
            n: Some(record.input),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
