//! Periodic report of jobs that have been pending for too long.
//!
//! A runner that crashes or never starts leaves its record pending forever
//! and the caller keeps polling. This task makes that visible in the logs.
//! It never changes a record: there is no failed state and no eviction.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use primer_core::job::JobRecord;
use primer_store::{JobStore, StoreResult};
use tokio_util::sync::CancellationToken;

/// Return the pending records older than `max_age`, logging each one.
pub async fn sweep(store: &dyn JobStore, max_age: Duration) -> StoreResult<Vec<JobRecord>> {
    let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
    let now = Utc::now();

    let stale: Vec<JobRecord> = store
        .list_pending()
        .await?
        .into_iter()
        .filter(|r| r.is_stale(now, max_age))
        .collect();

    for record in &stale {
        tracing::warn!(
            handle = %record.handle,
            input = record.input,
            pending_secs = (now - record.created_at).num_seconds(),
            "Job still pending, its runner may have failed"
        );
    }

    Ok(stale)
}

/// Run the stale-job check every `interval` until `cancel` is triggered.
pub async fn run(
    store: Arc<dyn JobStore>,
    max_age: Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        max_age_secs = max_age.as_secs(),
        interval_secs = interval.as_secs(),
        "Stale job monitor started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Stale job monitor stopping");
                break;
            }
            _ = ticker.tick() => {
                match sweep(store.as_ref(), max_age).await {
                    Ok(stale) if stale.is_empty() => {
                        tracing::debug!("Stale job monitor: nothing overdue");
                    }
                    Ok(stale) => {
                        tracing::warn!(count = stale.len(), "Stale job monitor: overdue jobs found");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Stale job monitor: store read failed");
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
