//! librqbit embedded transfer client.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use librqbit::{
    AddTorrent, AddTorrentOptions, AddTorrentResponse, ManagedTorrent, Session, SessionOptions,
};
use tracing::{debug, info, warn};

use super::config::TransferConfig;
use super::error::TransferError;
use super::traits::{TransferClient, TransferHandle};
use super::types::TransferDescriptor;

/// Starts one librqbit session per retrieval, rooted at the job's work
/// directory, so concurrent jobs never share output folders.
pub struct LibrqbitTransferClient {
    config: TransferConfig,
}

impl LibrqbitTransferClient {
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }

    fn session_options(&self) -> SessionOptions {
        let mut opts = SessionOptions::default();

        if !self.config.enable_dht {
            opts.disable_dht = true;
        }

        opts
    }
}

#[async_trait]
impl TransferClient for LibrqbitTransferClient {
    fn name(&self) -> &str {
        "librqbit"
    }

    async fn begin_retrieval(
        &self,
        descriptor: TransferDescriptor,
        work_dir: &Path,
    ) -> Result<Box<dyn TransferHandle>, TransferError> {
        tokio::fs::create_dir_all(work_dir).await?;

        let session = Session::new_with_opts(work_dir.to_path_buf(), self.session_options())
            .await
            .map_err(|e| TransferError::SessionFailed(e.to_string()))?;

        let opts = AddTorrentOptions {
            paused: false,
            ..Default::default()
        };
        let response = session
            .add_torrent(AddTorrent::from_bytes(descriptor.into_bytes()), Some(opts))
            .await
            .map_err(|e| TransferError::AddFailed(e.to_string()))?;

        let torrent = match response {
            AddTorrentResponse::Added(_, handle) => handle,
            AddTorrentResponse::AlreadyManaged(_, handle) => {
                warn!("Transfer already managed by this session");
                handle
            }
            AddTorrentResponse::ListOnly(_) => {
                return Err(TransferError::AddFailed(
                    "transfer was added in list-only mode".to_string(),
                ));
            }
        };

        info!(
            work_dir = %work_dir.display(),
            info_hash = %torrent.info_hash().as_string(),
            name = ?torrent.name(),
            "Retrieval started"
        );

        Ok(Box::new(LibrqbitHandle {
            session,
            torrent,
            work_dir: work_dir.to_path_buf(),
        }))
    }
}

struct LibrqbitHandle {
    session: Arc<Session>,
    torrent: Arc<ManagedTorrent>,
    work_dir: PathBuf,
}

#[async_trait]
impl TransferHandle for LibrqbitHandle {
    fn bytes_completed(&self) -> u64 {
        self.torrent.stats().progress_bytes
    }

    fn bytes_total(&self) -> u64 {
        self.torrent.stats().total_bytes
    }

    fn is_finished(&self) -> bool {
        self.torrent.stats().finished
    }

    fn files(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let mut pending = vec![self.work_dir.clone()];

        while let Some(dir) = pending.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                match entry.file_type() {
                    Ok(ft) if ft.is_dir() => pending.push(path),
                    Ok(ft) if ft.is_file() => {
                        if let Ok(relative) = path.strip_prefix(&self.work_dir) {
                            found.push(relative.to_path_buf());
                        }
                    }
                    _ => {}
                }
            }
        }

        found.sort();
        found
    }

    async fn await_metadata(&self, timeout: Duration) -> Result<(), TransferError> {
        let wait = async {
            while self.torrent.stats().total_bytes == 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| TransferError::MetadataTimeout(timeout))
    }

    async fn shutdown(&self) {
        let id = self.torrent.id();
        if let Err(e) = self.session.delete(id.into(), false).await {
            warn!(error = %e, "Failed to remove transfer from session");
        } else {
            debug!(work_dir = %self.work_dir.display(), "Transfer stopped");
        }
    }
}
