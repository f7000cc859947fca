use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use primer_core::job::JobHandle;
use primer_core::types::Candidate;
use primer_store::file::DEFAULT_STORE_PATH;
use primer_store::FileJobStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Test one integer for primality and record the answer against a pending job.
#[derive(Debug, Parser)]
#[command(name = "primer-worker", version)]
struct Args {
    /// Integer to test.
    #[arg(allow_negative_numbers = true)]
    number: Candidate,

    /// Handle of the pending job to complete.
    #[arg(short, long)]
    key: String,

    /// Shared job file written by the API server.
    #[arg(long, env = "JOB_STORE_PATH", default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "primer_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let handle = JobHandle::from(args.key);
    let store = FileJobStore::new(&args.store);

    tracing::info!(%handle, input = args.number, store = %args.store.display(), "Worker starting");

    let record = primer_worker::run_job(&store, &handle, args.number)
        .await
        .with_context(|| format!("job {handle} for {}", args.number))?;

    tracing::info!(%handle, result = ?record.result, "Worker finished");
    Ok(())
}
