//! One job's state machine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::error::WorkerError;
use super::types::{JobOutcome, JobOutcomeKind, WorkerSettings};
use crate::chapter::ChapterRange;
use crate::metadata::{is_video_file, MetadataIndex};
use crate::metrics;
use crate::placer::{BatchPlacement, PlacementOutcome, Placer};
use crate::registry::{JobStatus, ProgressRegistry};
use crate::release::ReleaseJob;
use crate::transfer::{DescriptorSource, TransferClient, TransferHandle};

/// Everything a worker needs, shared by all workers of a session.
#[derive(Clone)]
pub struct WorkerContext {
    pub transfer: Arc<dyn TransferClient>,
    pub descriptors: Arc<dyn DescriptorSource>,
    pub placer: Arc<dyn Placer>,
    pub registry: Arc<ProgressRegistry>,
    pub index: Arc<MetadataIndex>,
    pub settings: WorkerSettings,
    /// Tracks placement tasks so the session can wait for them.
    pub placements: TaskTracker,
}

/// Runs `job` to a terminal state.
///
/// The record for `job` must already be registered. Its final status and
/// message are written before this returns.
pub async fn run_job(
    ctx: &WorkerContext,
    job: &ReleaseJob,
    work_dir: &Path,
    cancel: CancellationToken,
) -> JobOutcome {
    let started = std::time::Instant::now();
    let deadline = Instant::now() + ctx.settings.job_timeout;
    metrics::JOBS_STARTED.inc();

    info!(transfer_id = job.transfer_id, title = %job.label(), "Job started");

    let result = drive(ctx, job, work_dir, &cancel, deadline).await;

    let (kind, message, placements) = match result {
        Ok(batch) => {
            let placements: Vec<String> =
                batch.outcomes.iter().map(|o| o.summary.clone()).collect();
            (JobOutcomeKind::Completed, batch.summary(), placements)
        }
        Err(e) => {
            let placements = ctx
                .registry
                .get(job.transfer_id)
                .map(|r| r.placements)
                .unwrap_or_default();
            (e.kind(), e.message(), placements)
        }
    };

    ctx.registry.update(job.transfer_id, |record| {
        record.finish(kind.status(), message.clone());
    });

    let elapsed = started.elapsed().as_secs_f64();
    if kind.is_success() {
        metrics::JOBS_COMPLETED.inc();
        metrics::JOB_DURATION
            .with_label_values(&["success"])
            .observe(elapsed);
        info!(transfer_id = job.transfer_id, message = %message, "Job finished");
    } else {
        metrics::JOBS_FAILED.with_label_values(&[kind.as_str()]).inc();
        metrics::JOB_DURATION
            .with_label_values(&["failed"])
            .observe(elapsed);
        warn!(transfer_id = job.transfer_id, outcome = kind.as_str(), message = %message, "Job did not complete");
    }

    JobOutcome {
        transfer_id: job.transfer_id,
        kind,
        message,
        placements,
    }
}

async fn drive(
    ctx: &WorkerContext,
    job: &ReleaseJob,
    work_dir: &Path,
    cancel: &CancellationToken,
    deadline: Instant,
) -> Result<BatchPlacement, WorkerError> {
    let id = job.transfer_id;

    // FetchingMetadata
    set_status(ctx, id, JobStatus::FetchingMetadata);
    let bytes = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(WorkerError::Cancelled),
        _ = sleep_until(deadline) => return Err(WorkerError::Timeout),
        fetched = ctx.descriptors.fetch(job) => fetched?,
    };
    let descriptor = ctx.transfer.load_descriptor(bytes)?;
    debug!(transfer_id = id, size = descriptor.len(), "Descriptor loaded");

    // Transferring
    set_status(ctx, id, JobStatus::Transferring);
    let handle = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(WorkerError::Cancelled),
        _ = sleep_until(deadline) => return Err(WorkerError::Timeout),
        started = ctx.transfer.begin_retrieval(descriptor, work_dir) => started?,
    };

    let transferred = transfer(ctx, id, handle.as_ref(), cancel, deadline).await;
    let files = match &transferred {
        Ok(()) => handle.files(),
        Err(_) => Vec::new(),
    };
    handle.shutdown().await;
    transferred?;

    // Placing. Not cancellable from here on.
    set_status(ctx, id, JobStatus::Placing);
    let sources: Vec<PathBuf> = files
        .into_iter()
        .map(|relative| work_dir.join(relative))
        .filter(|path| is_video_file(path))
        .collect();

    // Owned by the session's placement tracker, so aborting this worker
    // never interrupts a copy.
    let placing = ctx.placements.spawn(place_and_record(
        Arc::clone(&ctx.placer),
        Arc::clone(&ctx.index),
        Arc::clone(&ctx.registry),
        job.placement_range(),
        sources,
        id,
    ));
    let batch = placing
        .await
        .map_err(|e| WorkerError::Placement(format!("placement task failed: {e}")))?;

    if batch.total > 0 && batch.outcomes.is_empty() && !batch.errors.is_empty() {
        return Err(WorkerError::Placement(batch.summary()));
    }

    Ok(batch)
}

/// Places `sources`, appending each summary to the record as the file lands.
async fn place_and_record(
    placer: Arc<dyn Placer>,
    index: Arc<MetadataIndex>,
    registry: Arc<ProgressRegistry>,
    range: ChapterRange,
    sources: Vec<PathBuf>,
    id: u64,
) -> BatchPlacement {
    let record_placement = |outcome: &PlacementOutcome| {
        metrics::FILES_PLACED
            .with_label_values(&[outcome.kind.as_str()])
            .inc();
        registry.update(id, |record| {
            record.placements.push(outcome.summary.clone());
            record.placed = true;
        });
    };

    let batch = placer
        .place_each(&sources, &index, &range, &record_placement)
        .await;

    if !batch.errors.is_empty() {
        metrics::PLACEMENT_FAILURES.inc_by(batch.errors.len() as u64);
    }
    batch
}

/// Polls the handle into the registry until it finishes, the deadline
/// passes or the job is cancelled.
async fn transfer(
    ctx: &WorkerContext,
    id: u64,
    handle: &dyn TransferHandle,
    cancel: &CancellationToken,
    deadline: Instant,
) -> Result<(), WorkerError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(WorkerError::Cancelled),
        _ = sleep_until(deadline) => return Err(WorkerError::Timeout),
        ready = handle.await_metadata(ctx.settings.metadata_timeout) => ready?,
    }

    loop {
        let done = handle.bytes_completed();
        let total = handle.bytes_total();
        ctx.registry.update(id, |record| {
            record.bytes_done = done;
            record.bytes_total = total;
        });

        if handle.is_finished() {
            metrics::BYTES_TRANSFERRED.inc_by(total);
            debug!(transfer_id = id, bytes = total, "Transfer finished");
            return Ok(());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WorkerError::Cancelled),
            _ = sleep_until(deadline) => return Err(WorkerError::Timeout),
            _ = sleep(ctx.settings.poll_interval) => {}
        }
    }
}

fn set_status(ctx: &WorkerContext, id: u64, status: JobStatus) {
    ctx.registry.update(id, |record| record.status = status);
    debug!(transfer_id = id, status = %status, "Job status changed");
}
