//! `download`: run one session over a batch of releases.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chapterbay_core::session::{recover_stale_state, ProgressReporter, TracingSink};
use chapterbay_core::{
    Config, DownloadSession, FsPlacer, HttpDescriptorSource, LibrqbitTransferClient,
    MetadataCache, Placer, ProgressRegistry, ReleaseJob,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::server::{self, AppState};

pub async fn run_download(
    config: &Config,
    jobs: Vec<ReleaseJob>,
    max_jobs: Option<usize>,
) -> Result<()> {
    let mut session_config = config.session.clone();
    if let Some(n) = max_jobs {
        if n == 0 {
            bail!("--jobs must be at least 1");
        }
        session_config = session_config.with_max_concurrent_jobs(n);
    }

    let snapshot = session_config.snapshot_path();
    recover_stale_state(&session_config.work_root(), &snapshot);

    let root = &config.library.root_dir;
    let placer = FsPlacer::new(root, config.placer.clone());
    placer
        .validate()
        .await
        .with_context(|| format!("Library root {:?} is not usable", root))?;

    let index = MetadataCache::new(root).get();
    if index.is_empty() {
        warn!("Metadata index is empty, every file will be filed as stray; run `chapterbay index` first");
    }

    let descriptors = HttpDescriptorSource::new(config.source.clone())
        .context("Failed to create descriptor source")?;
    let transfer = LibrqbitTransferClient::new(config.transfer.clone());
    let registry = Arc::new(ProgressRegistry::with_snapshot_file(&snapshot));

    let session = DownloadSession::new(
        session_config.clone(),
        Arc::new(transfer),
        Arc::new(descriptors),
        Arc::new(placer),
        Arc::clone(&registry),
    )
    .with_index(index);

    let server_shutdown = CancellationToken::new();
    let server_task = if config.status_server.enabled {
        let state = Arc::new(AppState::new(Arc::clone(&registry)));
        Some(server::spawn(&config.status_server, state, server_shutdown.clone()).await?)
    } else {
        None
    };

    let cancel = CancellationToken::new();
    let signal_task = tokio::spawn(cancel_on_signal(cancel.clone()));
    let reporter = ProgressReporter::spawn(
        Arc::clone(&registry),
        Arc::new(TracingSink),
        session_config.report_interval(),
    );

    let total = jobs.len();
    info!(jobs = total, "Starting downloads");
    let report = session.run(jobs, cancel).await;

    reporter.stop().await;
    signal_task.abort();
    server_shutdown.cancel();
    if let Some(task) = server_task {
        if let Err(e) = task.await {
            warn!(error = %e, "Status server task ended abnormally");
        }
    }

    for line in report.lines() {
        println!("{line}");
    }
    println!(
        "{}/{} downloads completed in {:.0}s",
        report.completed_count(),
        total,
        report.elapsed.as_secs_f64()
    );

    if report.cancelled {
        bail!("Download session cancelled");
    }
    if !report.all_completed() {
        bail!("{} of {} downloads did not complete", report.failed_count(), total);
    }
    Ok(())
}

async fn cancel_on_signal(cancel: CancellationToken) {
    shutdown_signal().await;
    warn!("Shutdown requested, cancelling downloads");
    cancel.cancel();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
