//! Configuration for download sessions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::cleanup::WORK_DIR_PREFIX;
use crate::worker::WorkerSettings;

/// File name of the default registry snapshot in the temp directory.
const DEFAULT_SNAPSHOT_FILE: &str = "chapterbay-active.json";

/// Session supervisor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Workers running at the same time.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_jobs: usize,

    /// Deadline for one job's fetch and transfer, in seconds.
    #[serde(default = "default_job_timeout")]
    pub job_timeout_secs: u64,

    /// How long cancelled workers get to unwind, in milliseconds.
    #[serde(default = "default_grace_period")]
    pub grace_period_ms: u64,

    /// Progress sampling interval while transferring, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Wait for a transfer to report its size, in seconds.
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,

    /// Background progress report interval, in milliseconds.
    #[serde(default = "default_report_interval")]
    pub report_interval_ms: u64,

    /// Parent of the per-job work directories (default: system temp dir).
    #[serde(default)]
    pub work_root: Option<PathBuf>,

    /// Registry snapshot file (default: `<temp>/chapterbay-active.json`).
    #[serde(default)]
    pub registry_snapshot: Option<PathBuf>,
}

fn default_max_concurrent() -> usize {
    5
}

fn default_job_timeout() -> u64 {
    30 * 60
}

fn default_grace_period() -> u64 {
    5_000
}

fn default_poll_interval() -> u64 {
    1_000
}

fn default_metadata_timeout() -> u64 {
    20
}

fn default_report_interval() -> u64 {
    1_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent(),
            job_timeout_secs: default_job_timeout(),
            grace_period_ms: default_grace_period(),
            poll_interval_ms: default_poll_interval(),
            metadata_timeout_secs: default_metadata_timeout(),
            report_interval_ms: default_report_interval(),
            work_root: None,
            registry_snapshot: None,
        }
    }
}

impl SessionConfig {
    pub fn with_max_concurrent_jobs(mut self, jobs: usize) -> Self {
        self.max_concurrent_jobs = jobs;
        self
    }

    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period_ms = grace.as_millis() as u64;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            metadata_timeout: Duration::from_secs(self.metadata_timeout_secs),
            job_timeout: Duration::from_secs(self.job_timeout_secs),
        }
    }

    pub fn work_root(&self) -> PathBuf {
        self.work_root.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// `<work_root>/chapterbay-tmp-<id>`.
    pub fn work_dir_for(&self, transfer_id: u64) -> PathBuf {
        self.work_root()
            .join(format!("{WORK_DIR_PREFIX}{transfer_id}"))
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.registry_snapshot
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_SNAPSHOT_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.max_concurrent_jobs, 5);
        assert_eq!(config.grace_period(), Duration::from_secs(5));

        let settings = config.worker_settings();
        assert_eq!(settings.job_timeout, Duration::from_secs(1800));
        assert_eq!(settings.poll_interval, Duration::from_secs(1));
        assert_eq!(settings.metadata_timeout, Duration::from_secs(20));

        assert!(config
            .snapshot_path()
            .ends_with("chapterbay-active.json"));
    }

    #[test]
    fn test_work_dir_for() {
        let config = SessionConfig::default().with_work_root("/scratch");
        assert_eq!(
            config.work_dir_for(42),
            PathBuf::from("/scratch/chapterbay-tmp-42")
        );
    }
}
