use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the job store answered.
    pub store_healthy: bool,
    /// Number of jobs still waiting for a result, if the store answered.
    pub pending_jobs: Option<usize>,
}

/// GET /health -- returns service and job store health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let pending = match state.store.list_pending().await {
        Ok(records) => Some(records.len()),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not read job store");
            None
        }
    };
    let store_healthy = pending.is_some();

    Json(HealthResponse {
        status: if store_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        store_healthy,
        pending_jobs: pending,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
