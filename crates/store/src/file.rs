//! Job store backed by a single JSON file shared between processes.
//!
//! The file holds one JSON object mapping handle to record. Access is
//! serialised through an OS-level lock on a sidecar `<path>.lock` file,
//! held for the whole sequence:
//!
//! - reads take a shared lock;
//! - read-modify-write sequences (create, complete) take an exclusive lock
//!   held from the initial read through the final write-back.
//!
//! Two writers therefore never both load the same table, each change one
//! entry, and overwrite each other's update on write-back. Each call opens
//! its own file description, so the lock also serialises threads inside one
//! process.
//!
//! Write-back goes to a temp file that is renamed over the store. The store
//! file is always either the old table or the new one; a writer killed
//! mid-write cannot truncate it.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use primer_core::error::CoreError;
use primer_core::job::{JobHandle, JobRecord};
use primer_core::types::Candidate;
use tempfile::NamedTempFile;

use crate::{reserve_handle, HandleGenerator, JobStore, StoreResult};

/// Default file name, relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = "async_results.json";

type JobTable = BTreeMap<JobHandle, JobRecord>;

/// File-backed [`JobStore`] for deployments where the worker runs as a
/// separate process.
#[derive(Debug, Clone)]
pub struct FileJobStore {
    path: PathBuf,
    generate: HandleGenerator,
}

impl FileJobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_handle_generator(path, JobHandle::generate)
    }

    pub fn with_handle_generator(path: impl Into<PathBuf>, generate: HandleGenerator) -> Self {
        Self {
            path: path.into(),
            generate,
        }
    }

    /// Build a store and verify the file can be opened and parsed.
    ///
    /// A missing file is created empty.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self::new(path);
        let path = store.path.clone();
        let count = tokio::task::spawn_blocking(move || with_exclusive(&path, |t| Ok(t.len())))
            .await??;
        tracing::info!(path = %store.path.display(), records = count, "File job store opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the table under a shared lock on the blocking pool.
    async fn read<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&JobTable) -> StoreResult<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || with_shared(&path, f)).await?
    }

    /// Run `f` against the table under an exclusive lock on the blocking
    /// pool, writing the table back if `f` succeeds.
    async fn modify<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut JobTable) -> StoreResult<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || with_exclusive(&path, f)).await?
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn create(&self, input: Candidate) -> StoreResult<JobRecord> {
        let generate = self.generate;
        let record = self
            .modify(move |table| {
                let handle = reserve_handle(generate, |h| table.contains_key(h))?;
                let record = JobRecord::pending(handle.clone(), input, Utc::now());
                table.insert(handle, record.clone());
                Ok(record)
            })
            .await?;

        tracing::debug!(handle = %record.handle, input, "Job created");
        Ok(record)
    }

    async fn get(&self, handle: &JobHandle) -> StoreResult<JobRecord> {
        let handle = handle.clone();
        self.read(move |table| {
            table
                .get(&handle)
                .cloned()
                .ok_or_else(|| CoreError::NotFound(handle).into())
        })
        .await
    }

    async fn complete(&self, handle: &JobHandle, result: bool) -> StoreResult<JobRecord> {
        let key = handle.clone();
        let record = self
            .modify(move |table| {
                let record = table
                    .get_mut(&key)
                    .ok_or_else(|| CoreError::NotFound(key.clone()))?;
                record.complete(result, Utc::now())?;
                Ok(record.clone())
            })
            .await?;

        tracing::debug!(%handle, input = record.input, result, "Job completed");
        Ok(record)
    }

    async fn list_pending(&self) -> StoreResult<Vec<JobRecord>> {
        self.read(|table| Ok(table.values().filter(|r| r.is_pending()).cloned().collect()))
            .await
    }
}

// ---------------------------------------------------------------------------
// Blocking helpers
// ---------------------------------------------------------------------------

/// Sidecar lock file: `<path>.lock`.
fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn open_lock(path: &Path) -> StoreResult<File> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(lock_path(path))?;
    Ok(file)
}

/// Load the table; a missing or blank file is an empty table.
fn read_table(path: &Path) -> StoreResult<JobTable> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(JobTable::new()),
        Err(e) => return Err(e.into()),
    };
    if contents.trim().is_empty() {
        return Ok(JobTable::new());
    }
    Ok(serde_json::from_str(&contents)?)
}

/// Replace the store file with `table`.
///
/// The table is written to a temp file in the same directory and renamed
/// over the store, so a writer that dies part-way leaves the previous table
/// intact.
fn write_table(path: &Path, table: &JobTable) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, table)?;
    tmp.as_file_mut().sync_data()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// The lock is released when the lock file is dropped at the end of each
// helper.

fn with_shared<T>(path: &Path, f: impl FnOnce(&JobTable) -> StoreResult<T>) -> StoreResult<T> {
    let lock = open_lock(path)?;
    FileExt::lock_shared(&lock)?;
    let table = read_table(path)?;
    f(&table)
}

fn with_exclusive<T>(
    path: &Path,
    f: impl FnOnce(&mut JobTable) -> StoreResult<T>,
) -> StoreResult<T> {
    let lock = open_lock(path)?;
    FileExt::lock_exclusive(&lock)?;
    let mut table = read_table(path)?;
    let out = f(&mut table)?;
    write_table(path, &table)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io::Write;
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use primer_core::job::JobStatus;
    use tempfile::TempDir;

    use super::*;
    use crate::StoreError;

    fn temp_store() -> (TempDir, FileJobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::new(dir.path().join(DEFAULT_STORE_PATH));
        (dir, store)
    }

    #[tokio::test]
    async fn open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");

        let store = FileJobStore::open(&path).await.unwrap();

        assert!(path.exists());
        assert!(store.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileJobStore::open(&path).await.unwrap_err();

        assert_matches!(err, StoreError::Corrupt(_));
    }

    #[tokio::test]
    async fn create_then_get_roundtrips_through_file() {
        let (_dir, store) = temp_store();

        let record = store.create(50_000_000).await.unwrap();

        let reopened = FileJobStore::new(store.path());
        let stored = reopened.get(&record.handle).await.unwrap();
        assert_eq!(stored, record);
        assert_eq!(stored.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn complete_persists_and_rejects_second_write() {
        let (_dir, store) = temp_store();
        let record = store.create(1_299_827).await.unwrap();

        store.complete(&record.handle, true).await.unwrap();
        let err = store.complete(&record.handle, false).await.unwrap_err();

        assert_matches!(err, StoreError::Core(CoreError::AlreadyComplete(_)));
        let stored = store.get(&record.handle).await.unwrap();
        assert_eq!(stored.status, JobStatus::Complete);
        assert_eq!(stored.result, Some(true));
    }

    #[tokio::test]
    async fn unknown_handle_is_not_found() {
        let (_dir, store) = temp_store();

        assert!(store
            .get(&JobHandle::from("nope"))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store
            .complete(&JobHandle::from("nope"), true)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn colliding_handle_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::with_handle_generator(dir.path().join("jobs.json"), || {
            JobHandle::from("dup")
        });
        store.create(11).await.unwrap();

        let err = store.create(13).await.unwrap_err();

        assert_matches!(err, StoreError::Core(CoreError::Internal(_)));
        assert_eq!(store.get(&JobHandle::from("dup")).await.unwrap().input, 11);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_are_all_kept() {
        let (_dir, store) = temp_store();
        let store = Arc::new(store);

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create(30_000_000 + i).await.unwrap() })
            })
            .collect();

        let mut handles = HashSet::new();
        for task in tasks {
            let record = task.await.unwrap();
            assert_eq!(store.get(&record.handle).await.unwrap().input, record.input);
            handles.insert(record.handle);
        }

        assert_eq!(handles.len(), 50);
        assert_eq!(store.list_pending().await.unwrap().len(), 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_completions_do_not_lose_updates() {
        let (_dir, store) = temp_store();
        let store = Arc::new(store);

        let mut records = Vec::new();
        for i in 0..40 {
            records.push(store.create(40_000_000 + i).await.unwrap());
        }

        let tasks: Vec<_> = records
            .iter()
            .map(|record| {
                let store = Arc::clone(&store);
                let handle = record.handle.clone();
                let result = record.input % 2 == 1;
                tokio::spawn(async move { store.complete(&handle, result).await.unwrap() })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(store.list_pending().await.unwrap().is_empty());
        for record in &records {
            let stored = store.get(&record.handle).await.unwrap();
            assert_eq!(stored.status, JobStatus::Complete);
            assert_eq!(stored.result, Some(record.input % 2 == 1));
        }
    }

    #[test]
    fn empty_file_reads_as_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(&path, "  \n").unwrap();

        let len = with_shared(&path, |t| Ok(t.len())).unwrap();

        assert_eq!(len, 0);
    }

    #[tokio::test]
    async fn interrupted_write_leaves_table_readable() {
        let (dir, store) = temp_store();
        let record = store.create(7919).await.unwrap();
        let before = std::fs::read(store.path()).unwrap();

        // A writer killed mid-write leaves only a partial temp file behind.
        let mut partial = NamedTempFile::new_in(dir.path()).unwrap();
        partial.write_all(&before[..before.len() / 2]).unwrap();
        let (_file, stray) = partial.keep().unwrap();

        assert_eq!(std::fs::read(store.path()).unwrap(), before);
        assert_eq!(store.get(&record.handle).await.unwrap(), record);

        store.complete(&record.handle, true).await.unwrap();
        assert!(stray.exists());
        let reopened = FileJobStore::open(store.path()).await.unwrap();
        assert_eq!(
            reopened.get(&record.handle).await.unwrap().result,
            Some(true)
        );
    }

    #[tokio::test]
    async fn failed_update_does_not_touch_file() {
        let (_dir, store) = temp_store();
        let record = store.create(104_729).await.unwrap();
        let before = std::fs::read(store.path()).unwrap();

        assert!(store
            .complete(&JobHandle::from("nope"), true)
            .await
            .unwrap_err()
            .is_not_found());

        assert_eq!(std::fs::read(store.path()).unwrap(), before);
        assert!(store.get(&record.handle).await.unwrap().is_pending());
    }

    #[test]
    fn lock_file_sits_next_to_store() {
        let path = Path::new("/var/lib/primer/jobs.json");

        assert_eq!(lock_path(path), Path::new("/var/lib/primer/jobs.json.lock"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_never_see_complete_revert_to_pending() {
        let (_dir, store) = temp_store();
        let store = Arc::new(store);
        let record = store.create(65537).await.unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let handle = record.handle.clone();
                tokio::spawn(async move {
                    let mut seen_complete = false;
                    for _ in 0..100 {
                        let current = store.get(&handle).await.unwrap();
                        if seen_complete {
                            assert_eq!(current.status, JobStatus::Complete);
                            assert_eq!(current.result, Some(true));
                        }
                        if current.status == JobStatus::Complete {
                            seen_complete = true;
                        } else {
                            assert_eq!(current.result, None);
                        }
                    }
                })
            })
            .collect();

        store.complete(&record.handle, true).await.unwrap();

        for reader in readers {
            reader.await.unwrap();
        }
        assert_eq!(store.get(&record.handle).await.unwrap().result, Some(true));
    }
}
