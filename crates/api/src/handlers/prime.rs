//! Handler for the prime endpoint.
//!
//! One endpoint serves two purposes: `?n=<integer>` asks whether a number
//! is prime, `?key=<handle>` polls a previously deferred answer. Small
//! numbers are answered inline, mid-sized ones become background jobs, and
//! anything above the compute limit is refused.

use std::time::{Duration, Instant};

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use primer_core::dispatch::{Dispatch, DispatchPolicy};
use primer_core::job::JobHandle;
use primer_core::primality::{is_prime_within, parse_candidate, ParseCandidateError};
use primer_core::types::Candidate;

use crate::error::{AppError, AppResult};
use crate::query::PrimeParams;
use crate::response::PrimeResponse;
use crate::state::AppState;

/// Message for a request with neither `n` nor `key`.
pub const MSG_NO_INPUT: &str = "No data received. Submit your number like ?n=<some integer>";

// ---------------------------------------------------------------------------
// GET|POST / -- test a number or poll a job
// ---------------------------------------------------------------------------

/// Dispatch a prime request.
///
/// `key` takes precedence over `n` when both are present.
pub async fn check_prime(
    State(state): State<AppState>,
    params: Result<Query<PrimeParams>, QueryRejection>,
) -> AppResult<Json<PrimeResponse>> {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable query string");
            return Ok(Json(PrimeResponse::failure(format!(
                "Could not read the request: {}",
                rejection.body_text()
            ))));
        }
    };

    if let Some(key) = params.key {
        return lookup_job(&state, key).await.map(Json);
    }

    let Some(raw) = params.n else {
        return Ok(Json(PrimeResponse::failure(MSG_NO_INPUT)));
    };

    let n = match parse_candidate(&raw) {
        Ok(n) => n,
        Err(ParseCandidateError::TooLarge) => return Ok(Json(out_of_range(&state.policy))),
        Err(ParseCandidateError::NotAnInteger) => {
            return Ok(Json(PrimeResponse::failure(format!(
                "Did not understand {raw}. Submit an integer number. (e.g. ...?n=5)"
            ))));
        }
    };

    let response = match state.policy.classify(n) {
        Dispatch::Reject => out_of_range(&state.policy),
        Dispatch::Sync => {
            answer_now(n, Duration::from_secs(state.config.request_timeout_secs)).await?
        }
        Dispatch::Async => defer(&state, n).await?,
    };
    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// Branches
// ---------------------------------------------------------------------------

async fn lookup_job(state: &AppState, key: String) -> AppResult<PrimeResponse> {
    match state.store.get(&JobHandle::from(key.as_str())).await {
        Ok(record) => Ok(PrimeResponse::job_status(record)),
        Err(e) if e.is_not_found() => {
            tracing::debug!(%key, "Unknown job key");
            Ok(PrimeResponse::failure(format!("Key {key} not found.")))
        }
        Err(e) => Err(e.into()),
    }
}

fn out_of_range(policy: &DispatchPolicy) -> PrimeResponse {
    PrimeResponse::failure(format!(
        "Cannot test numbers greater than {}",
        policy.compute_limit()
    ))
}

/// Compute inline. Runs on the blocking pool but the caller still waits for
/// the answer in this response.
///
/// The computation stops once `budget` is spent so a slow inline check does
/// not keep a blocking thread busy after the request has been answered.
async fn answer_now(n: Candidate, budget: Duration) -> AppResult<PrimeResponse> {
    let deadline = Instant::now() + budget;
    let result = tokio::task::spawn_blocking(move || is_prime_within(n, deadline))
        .await
        .map_err(|e| AppError::InternalError(format!("primality check for {n} failed: {e}")))?;

    match result {
        Some(result) => Ok(PrimeResponse::answer(result)),
        None => {
            tracing::warn!(n, budget_secs = budget.as_secs(), "Inline primality check timed out");
            Ok(PrimeResponse::failure(format!(
                "Testing {n} timed out after {} seconds",
                budget.as_secs()
            )))
        }
    }
}

/// Create a job and start it without waiting.
///
/// If the runner cannot start, the record stays pending and the caller still
/// gets its handle; the failure is only visible in the logs and through the
/// stale-job monitor.
async fn defer(state: &AppState, n: Candidate) -> AppResult<PrimeResponse> {
    let record = state.store.create(n).await?;

    match state.runner.spawn(record.handle.clone(), n) {
        Ok(()) => tracing::info!(handle = %record.handle, n, "Deferred primality job"),
        Err(e) => tracing::error!(
            handle = %record.handle,
            n,
            error = %e,
            "Failed to start job, record left pending"
        ),
    }

    Ok(PrimeResponse::deferred(n, record.handle))
}
