use std::any::Any;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::BoxError;
use primer_store::StoreError;
use tower::timeout::error::Elapsed;

use crate::response::PrimeResponse;

/// Application-level error type for HTTP handlers.
///
/// Only internal faults end up here; expected outcomes (bad input, unknown
/// key, out of range) are ordinary [`PrimeResponse`]s. Implements
/// [`IntoResponse`] so that even these faults reach the caller in the
/// common response shape.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The job store failed.
    #[error("Job store error: {0}")]
    Store(#[from] StoreError),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");

        let body = PrimeResponse::failure("An internal error occurred");
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}

/// Response for a request cut off by the timeout middleware.
pub fn timeout_response(err: BoxError, timeout: Duration) -> Response {
    if err.is::<Elapsed>() {
        tracing::warn!(timeout_secs = timeout.as_secs(), "Request timed out");
        let body = PrimeResponse::failure(format!(
            "Request timed out after {} seconds",
            timeout.as_secs()
        ));
        return (StatusCode::REQUEST_TIMEOUT, axum::Json(body)).into_response();
    }

    AppError::InternalError(format!("unhandled middleware error: {err}")).into_response()
}

/// Response for a handler that panicked.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = detail, "Handler panicked");

    let body = PrimeResponse::failure("An internal error occurred");
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
