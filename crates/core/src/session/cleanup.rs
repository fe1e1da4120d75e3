//! Work directory removal and crash recovery.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info, warn};

/// Prefix of every per-job work directory.
pub const WORK_DIR_PREFIX: &str = "chapterbay-tmp-";

/// Removes a job's work directory. A missing directory is fine.
pub async fn remove_work_dir(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed work directory"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove work directory"),
    }
}

/// What [`recover_stale_state`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaleCleanup {
    pub snapshot_removed: bool,
    pub work_dirs_removed: usize,
}

/// Deletes the registry snapshot and every work directory a crashed run
/// left behind.
pub fn recover_stale_state(work_root: &Path, snapshot: &Path) -> StaleCleanup {
    let mut cleanup = StaleCleanup::default();

    match fs::remove_file(snapshot) {
        Ok(()) => cleanup.snapshot_removed = true,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %snapshot.display(), error = %e, "Failed to remove stale snapshot"),
    }

    let entries = match fs::read_dir(work_root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(path = %work_root.display(), error = %e, "Work root not readable");
            return cleanup;
        }
    };

    for entry in entries.flatten() {
        let is_work_dir = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(WORK_DIR_PREFIX));
        if !is_work_dir || !entry.path().is_dir() {
            continue;
        }
        match fs::remove_dir_all(entry.path()) {
            Ok(()) => cleanup.work_dirs_removed += 1,
            Err(e) => warn!(path = %entry.path().display(), error = %e, "Failed to remove stale work directory"),
        }
    }

    if cleanup != StaleCleanup::default() {
        info!(
            snapshot_removed = cleanup.snapshot_removed,
            work_dirs_removed = cleanup.work_dirs_removed,
            "Cleared state left by a previous run"
        );
    }
    cleanup
}
