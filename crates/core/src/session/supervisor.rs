//! Bounded worker pool over a batch of release jobs.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::cleanup::remove_work_dir;
use super::config::SessionConfig;
use super::report::{JobReport, SessionReport};
use crate::metadata::MetadataIndex;
use crate::placer::Placer;
use crate::registry::{JobStatus, ProgressRegistry};
use crate::release::ReleaseJob;
use crate::transfer::{DescriptorSource, TransferClient};
use crate::worker::{run_job, JobOutcome, JobOutcomeKind, WorkerContext};

const CANCELLED_MESSAGE: &str = "Cancelled";

/// Runs batches of release jobs.
pub struct DownloadSession {
    config: SessionConfig,
    transfer: Arc<dyn TransferClient>,
    descriptors: Arc<dyn DescriptorSource>,
    placer: Arc<dyn Placer>,
    registry: Arc<ProgressRegistry>,
    index: Arc<MetadataIndex>,
}

impl DownloadSession {
    pub fn new(
        config: SessionConfig,
        transfer: Arc<dyn TransferClient>,
        descriptors: Arc<dyn DescriptorSource>,
        placer: Arc<dyn Placer>,
        registry: Arc<ProgressRegistry>,
    ) -> Self {
        Self {
            config,
            transfer,
            descriptors,
            placer,
            registry,
            index: Arc::new(MetadataIndex::new()),
        }
    }

    /// Metadata used to resolve placements. Without one every file goes to
    /// the stray folder.
    pub fn with_index(mut self, index: Arc<MetadataIndex>) -> Self {
        self.index = index;
        self
    }

    pub fn registry(&self) -> &Arc<ProgressRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Runs every job and returns once all of them reached a terminal state,
    /// or once `cancel` fired and the grace period ran out.
    pub async fn run(&self, jobs: Vec<ReleaseJob>, cancel: CancellationToken) -> SessionReport {
        let started = Instant::now();
        let jobs = Arc::new(jobs);

        for job in jobs.iter() {
            self.registry.register(job);
        }

        // Closed, pre-filled queue: every index is taken exactly once.
        let (tx, rx) = mpsc::channel(jobs.len().max(1));
        for index in 0..jobs.len() {
            if tx.try_send(index).is_err() {
                warn!(index, "Job queue rejected an index");
            }
        }
        drop(tx);
        let queue = Arc::new(tokio::sync::Mutex::new(rx));

        let outcomes: Arc<Mutex<Vec<Option<JobOutcome>>>> =
            Arc::new(Mutex::new(vec![None; jobs.len()]));

        let placements = TaskTracker::new();
        let ctx = WorkerContext {
            transfer: Arc::clone(&self.transfer),
            descriptors: Arc::clone(&self.descriptors),
            placer: Arc::clone(&self.placer),
            registry: Arc::clone(&self.registry),
            index: Arc::clone(&self.index),
            settings: self.config.worker_settings(),
            placements: placements.clone(),
        };

        let pool_size = self.config.max_concurrent_jobs.max(1).min(jobs.len());
        info!(jobs = jobs.len(), workers = pool_size, "Download session started");

        let mut workers = JoinSet::new();
        for worker_id in 0..pool_size {
            let ctx = ctx.clone();
            let jobs = Arc::clone(&jobs);
            let queue = Arc::clone(&queue);
            let outcomes = Arc::clone(&outcomes);
            let cancel = cancel.clone();
            let config = self.config.clone();

            workers.spawn(async move {
                loop {
                    let next = queue.lock().await.recv().await;
                    let Some(index) = next else {
                        break;
                    };
                    let job = &jobs[index];

                    let outcome = if cancel.is_cancelled() {
                        ctx.registry.update(job.transfer_id, |record| {
                            record.finish(JobStatus::Cancelled, CANCELLED_MESSAGE);
                        });
                        cancelled_outcome(job.transfer_id)
                    } else {
                        debug!(worker_id, transfer_id = job.transfer_id, "Worker picked up job");
                        let work_dir = config.work_dir_for(job.transfer_id);
                        run_job(&ctx, job, &work_dir, cancel.child_token()).await
                    };

                    outcomes.lock().unwrap_or_else(PoisonError::into_inner)[index] =
                        Some(outcome);
                }
            });
        }

        let drained = tokio::select! {
            _ = drain(&mut workers) => true,
            _ = cancel.cancelled() => false,
        };

        if !drained {
            let grace = self.config.grace_period();
            info!(grace_ms = grace.as_millis() as u64, "Session cancelled, waiting for workers");
            if tokio::time::timeout(grace, drain(&mut workers)).await.is_err() {
                warn!(
                    remaining = workers.len(),
                    "Workers did not stop within the grace period, aborting"
                );
                workers.abort_all();
            }
        }
        drop(workers);

        // Copies run to completion even for aborted workers; their sources
        // live in the work directories removed below.
        placements.close();
        if !placements.is_empty() {
            info!(in_flight = placements.len(), "Waiting for in-flight placements");
        }
        placements.wait().await;

        let marked = self
            .registry
            .finish_unfinished(JobStatus::Cancelled, CANCELLED_MESSAGE);
        if marked > 0 {
            debug!(marked, "Marked unfinished jobs as cancelled");
        }

        let outcomes = std::mem::take(&mut *outcomes.lock().unwrap_or_else(PoisonError::into_inner));
        let report = self.build_report(&jobs, outcomes, cancel.is_cancelled(), started);

        for job in &report.jobs {
            info!(transfer_id = job.transfer_id, outcome = job.kind.as_str(), "{}", job.line());
        }

        self.registry.clear();
        for job in jobs.iter() {
            remove_work_dir(&self.config.work_dir_for(job.transfer_id)).await;
        }

        info!(
            completed = report.completed_count(),
            failed = report.failed_count(),
            cancelled = report.cancelled,
            elapsed_secs = report.elapsed.as_secs(),
            "Download session finished"
        );
        report
    }

    fn build_report(
        &self,
        jobs: &[ReleaseJob],
        outcomes: Vec<Option<JobOutcome>>,
        cancelled: bool,
        started: Instant,
    ) -> SessionReport {
        let reports = jobs
            .iter()
            .zip(outcomes)
            .map(|(job, outcome)| {
                let record = self.registry.get(job.transfer_id);
                let status = record
                    .as_ref()
                    .map(|r| r.status)
                    .unwrap_or(JobStatus::Cancelled);

                // Aborted workers never produced an outcome.
                let outcome = outcome.unwrap_or_else(|| JobOutcome {
                    placements: record
                        .as_ref()
                        .map(|r| r.placements.clone())
                        .unwrap_or_default(),
                    ..cancelled_outcome(job.transfer_id)
                });

                JobReport {
                    transfer_id: job.transfer_id,
                    title: job.label(),
                    kind: outcome.kind,
                    status,
                    message: outcome.message,
                    placements: outcome.placements,
                }
            })
            .collect();

        SessionReport {
            jobs: reports,
            cancelled,
            elapsed: started.elapsed(),
        }
    }
}

fn cancelled_outcome(transfer_id: u64) -> JobOutcome {
    JobOutcome {
        transfer_id,
        kind: JobOutcomeKind::Cancelled,
        message: CANCELLED_MESSAGE.to_string(),
        placements: Vec::new(),
    }
}

async fn drain(workers: &mut JoinSet<()>) {
    while let Some(result) = workers.join_next().await {
        if let Err(e) = result {
            if e.is_panic() {
                warn!(error = %e, "Worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::testing::{MockDescriptorSource, MockPlacer, MockTransferClient};
    use tempfile::TempDir;

    fn session(
        work_root: &std::path::Path,
        transfer: MockTransferClient,
        placer: Arc<MockPlacer>,
        max_concurrent: usize,
    ) -> DownloadSession {
        let config = SessionConfig::default()
            .with_work_root(work_root)
            .with_max_concurrent_jobs(max_concurrent)
            .with_poll_interval(Duration::from_millis(10))
            .with_grace_period(Duration::from_millis(200));
        DownloadSession::new(
            config,
            Arc::new(transfer),
            Arc::new(MockDescriptorSource::new()),
            placer,
            Arc::new(ProgressRegistry::new()),
        )
    }

    fn jobs(count: u64) -> Vec<ReleaseJob> {
        (1..=count)
            .map(|id| ReleaseJob::new(format!("Job {id}"), id))
            .collect()
    }

    #[tokio::test]
    async fn test_every_job_runs_once() {
        let work = TempDir::new().unwrap();
        let transfer = MockTransferClient::new();
        transfer.add_file("episode.mkv", b"video").await;
        let placer = Arc::new(MockPlacer::new());

        let session = session(work.path(), transfer, Arc::clone(&placer), 3);
        let report = session.run(jobs(7), CancellationToken::new()).await;

        assert_eq!(report.jobs.len(), 7);
        assert!(report.all_completed());
        assert!(!report.cancelled);
        let ids: Vec<u64> = report.jobs.iter().map(|j| j.transfer_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(placer.placement_count().await, 7);

        // Registry cleared and work directories removed.
        assert!(session.registry().is_empty());
        assert!(!work.path().join("chapterbay-tmp-1").exists());
    }

    #[tokio::test]
    async fn test_placement_failure_fails_only_that_job() {
        let work = TempDir::new().unwrap();
        let transfer = MockTransferClient::new();
        transfer.add_file("episode.mkv", b"video").await;
        let placer = Arc::new(MockPlacer::new());
        placer.set_fail_all(true).await;

        let session = session(work.path(), transfer, Arc::clone(&placer), 2);
        let report = session.run(jobs(2), CancellationToken::new()).await;

        assert_eq!(report.failed_count(), 2);
        for job in &report.jobs {
            assert_eq!(job.kind, JobOutcomeKind::PlacementFailed);
            assert_eq!(job.status, JobStatus::Failed);
            assert!(job.message.starts_with("Failed: placement failed"));
        }
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let work = TempDir::new().unwrap();
        let session = session(
            work.path(),
            MockTransferClient::new(),
            Arc::new(MockPlacer::new()),
            5,
        );
        let report = session.run(Vec::new(), CancellationToken::new()).await;
        assert!(report.jobs.is_empty());
        assert!(report.all_completed());
    }

    #[tokio::test]
    async fn test_jobs_queued_after_cancel_never_start() {
        let work = TempDir::new().unwrap();
        let transfer = MockTransferClient::new().never_completes();
        let session = session(work.path(), transfer, Arc::new(MockPlacer::new()), 1);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let report = session.run(jobs(3), cancel).await;
        assert!(report.cancelled);
        assert!(report
            .jobs
            .iter()
            .all(|j| j.kind == JobOutcomeKind::Cancelled && j.status == JobStatus::Cancelled));
    }
}
