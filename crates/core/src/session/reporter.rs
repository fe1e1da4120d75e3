//! Background progress reporting.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::registry::{DownloadRecord, ProgressRegistry};

/// Receives registry snapshots while a session runs.
pub trait ProgressSink: Send + Sync {
    fn report(&self, records: &[DownloadRecord]);
}

/// Logs one line per record.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn report(&self, records: &[DownloadRecord]) {
        for record in records {
            info!(
                transfer_id = record.transfer_id,
                status = %record.status,
                percent = %format!("{:.1}", record.progress() * 100.0),
                "{}",
                record.title
            );
        }
    }
}

/// Periodically hands the registry to a sink until stopped.
pub struct ProgressReporter {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    pub fn spawn(
        registry: Arc<ProgressRegistry>,
        sink: Arc<dyn ProgressSink>,
        interval: Duration,
    ) -> Self {
        let stop = CancellationToken::new();
        let token = stop.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => sink.report(&registry.snapshot()),
                }
            }
            // Final flush so the last state is always seen.
            sink.report(&registry.snapshot());
            debug!("Progress reporter stopped");
        });

        Self { stop, handle }
    }

    /// Stops the reporter and waits for its final flush.
    pub async fn stop(self) {
        self.stop.cancel();
        if let Err(e) = self.handle.await {
            debug!(error = %e, "Progress reporter task ended abnormally");
        }
    }
}
