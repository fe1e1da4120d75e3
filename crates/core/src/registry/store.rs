//! Mutex-guarded record map with an optional snapshot file.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::error::RegistryError;
use super::types::{DownloadRecord, JobStatus};
use crate::release::ReleaseJob;

/// Shared progress state for one session.
#[derive(Debug, Default)]
pub struct ProgressRegistry {
    records: Mutex<HashMap<u64, DownloadRecord>>,
    snapshot_path: Option<PathBuf>,
}

impl ProgressRegistry {
    /// An in-memory registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that mirrors every mutation to `path`.
    pub fn with_snapshot_file(path: impl Into<PathBuf>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            snapshot_path: Some(path.into()),
        }
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Poisoning is ignored; records stay whole across a worker panic.
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, DownloadRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a `Queued` record for `job`, replacing any previous one.
    pub fn register(&self, job: &ReleaseJob) {
        self.upsert(DownloadRecord::queued(job));
    }

    /// Inserts or replaces a record.
    pub fn upsert(&self, record: DownloadRecord) {
        let mut records = self.lock();
        records.insert(record.transfer_id, record);
        self.persist(&records);
    }

    /// Applies `f` to the record for `transfer_id`.
    ///
    /// Returns `false` when there is no such record.
    pub fn update<F>(&self, transfer_id: u64, f: F) -> bool
    where
        F: FnOnce(&mut DownloadRecord),
    {
        let mut records = self.lock();
        let Some(record) = records.get_mut(&transfer_id) else {
            debug!(transfer_id, "Update for unknown record ignored");
            return false;
        };
        f(record);
        self.persist(&records);
        true
    }

    pub fn get(&self, transfer_id: u64) -> Option<DownloadRecord> {
        self.lock().get(&transfer_id).cloned()
    }

    /// Consistent copy of every record, ordered by start time then id.
    pub fn snapshot(&self) -> Vec<DownloadRecord> {
        let records = self.lock();
        sorted(&records)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Moves every non-terminal record to `status`. Returns how many changed.
    pub fn finish_unfinished(&self, status: JobStatus, message: &str) -> usize {
        let mut records = self.lock();
        let mut changed = 0;
        for record in records.values_mut() {
            if !record.status.is_terminal() {
                record.finish(status, message);
                changed += 1;
            }
        }
        if changed > 0 {
            self.persist(&records);
        }
        changed
    }

    /// Drops every record and removes the snapshot file.
    pub fn clear(&self) {
        let mut records = self.lock();
        records.clear();
        if let Some(path) = &self.snapshot_path {
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "Removed registry snapshot"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove registry snapshot"),
            }
        }
    }

    /// Rewrites the snapshot file. Called with the lock held so writes land
    /// in mutation order.
    fn persist(&self, records: &HashMap<u64, DownloadRecord>) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        if let Err(e) = write_snapshot(path, &sorted(records)) {
            warn!(error = %e, "Failed to write registry snapshot");
        }
    }
}

fn sorted(records: &HashMap<u64, DownloadRecord>) -> Vec<DownloadRecord> {
    let mut list: Vec<DownloadRecord> = records.values().cloned().collect();
    list.sort_by(|a, b| {
        a.started_at
            .cmp(&b.started_at)
            .then_with(|| a.transfer_id.cmp(&b.transfer_id))
    });
    list
}

fn write_snapshot(path: &Path, records: &[DownloadRecord]) -> Result<(), RegistryError> {
    let json = serde_json::to_vec_pretty(records).map_err(|source| RegistryError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    let mut staging = path.as_os_str().to_os_string();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    fs::write(&staging, json).map_err(|source| RegistryError::Io {
        path: staging.clone(),
        source,
    })?;
    fs::rename(&staging, path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a snapshot file written by a (possibly other) process.
///
/// A missing file means nothing is in flight.
pub fn read_snapshot(path: &Path) -> Result<Vec<DownloadRecord>, RegistryError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(RegistryError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_slice(&data).map_err(|source| RegistryError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn job(id: u64) -> ReleaseJob {
        ReleaseJob::new(format!("Job {id}"), id)
    }

    #[test]
    fn test_register_update_get() {
        let registry = ProgressRegistry::new();
        registry.register(&job(1));
        assert_eq!(registry.get(1).unwrap().status, JobStatus::Queued);

        assert!(registry.update(1, |r| {
            r.status = JobStatus::Transferring;
            r.bytes_done = 10;
        }));
        let record = registry.get(1).unwrap();
        assert_eq!(record.status, JobStatus::Transferring);
        assert_eq!(record.bytes_done, 10);

        assert!(!registry.update(2, |r| r.bytes_done = 1));
        assert!(registry.get(2).is_none());
    }

    #[test]
    fn test_finish_unfinished() {
        let registry = ProgressRegistry::new();
        registry.register(&job(1));
        registry.register(&job(2));
        registry.update(2, |r| r.finish(JobStatus::Done, "ok"));

        assert_eq!(registry.finish_unfinished(JobStatus::Cancelled, "Cancelled"), 1);
        assert_eq!(registry.get(1).unwrap().status, JobStatus::Cancelled);
        assert_eq!(registry.get(2).unwrap().status, JobStatus::Done);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_lose_nothing() {
        let registry = Arc::new(ProgressRegistry::new());
        let tasks = 32u64;

        let mut handles = Vec::new();
        for id in 0..tasks {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.register(&job(id));
                for step in 1..=50u64 {
                    registry.update(id, |r| r.bytes_done = step);
                    // Concurrent readers see whole records.
                    let snapshot = registry.snapshot();
                    assert!(snapshot.iter().all(|r| r.bytes_done <= 50));
                    tokio::task::yield_now().await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), tasks as usize);
        assert!(snapshot.iter().all(|r| r.bytes_done == 50));
    }

    #[test]
    fn test_snapshot_file_follows_mutations() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("active.json");
        let registry = ProgressRegistry::with_snapshot_file(&path);

        registry.register(&job(7));
        registry.update(7, |r| r.bytes_total = 100);

        let records = read_snapshot(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transfer_id, 7);
        assert_eq!(records[0].bytes_total, 100);

        registry.clear();
        assert!(registry.is_empty());
        assert!(!path.exists());
        assert!(read_snapshot(&path).unwrap().is_empty());
    }

    #[test]
    fn test_read_corrupt_snapshot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("active.json");
        fs::write(&path, "{").unwrap();
        assert!(matches!(
            read_snapshot(&path),
            Err(RegistryError::Corrupt { .. })
        ));
    }
}
