//! Mock transfer client and descriptor source for testing.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::release::ReleaseJob;
use crate::transfer::{
    DescriptorSource, FetchError, TransferClient, TransferDescriptor, TransferError,
    TransferHandle,
};

/// Descriptor bytes the mocks agree on: a bencoded dict carrying the id.
pub fn mock_descriptor(transfer_id: u64) -> Vec<u8> {
    let id = transfer_id.to_string();
    format!("d2:id{}:{}e", id.len(), id).into_bytes()
}

/// Inverse of [`mock_descriptor`].
pub fn parse_mock_descriptor(bytes: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(bytes).ok()?;
    let rest = text.strip_prefix("d2:id")?.strip_suffix('e')?;
    let (_, id) = rest.split_once(':')?;
    id.parse().ok()
}

/// A recorded retrieval for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRetrieval {
    pub transfer_id: Option<u64>,
    pub work_dir: PathBuf,
    pub timestamp: chrono::DateTime<Utc>,
}

/// Mock implementation of the TransferClient trait.
///
/// Provides controllable behavior for testing:
/// - Files written into the work directory when a retrieval starts
/// - Retrievals that never finish, for timeout and cancellation paths
/// - Simulated failures
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTransferClient::new();
/// client.add_file("[One Pace][8-11] Orange Town.mkv", b"video").await;
///
/// let handle = client.begin_retrieval(descriptor, work_dir).await?;
/// assert_eq!(client.retrieval_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockTransferClient {
    /// Files every retrieval produces.
    files: Arc<RwLock<Vec<(PathBuf, Vec<u8>)>>>,
    /// Extra files per transfer id.
    files_by_id: Arc<RwLock<HashMap<u64, Vec<(PathBuf, Vec<u8>)>>>>,
    /// Transfer ids whose retrieval never finishes.
    stalled: Arc<RwLock<HashSet<u64>>>,
    /// Recorded begin_retrieval calls.
    retrievals: Arc<RwLock<Vec<RecordedRetrieval>>>,
    /// If set, the next begin_retrieval will fail with this error.
    next_error: Arc<RwLock<Option<TransferError>>>,
    /// Polls of `is_finished` before a retrieval reports completion.
    polls_to_finish: u32,
    never_completes: bool,
    shutdowns: Arc<AtomicUsize>,
}

impl Default for MockTransferClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransferClient {
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(Vec::new())),
            files_by_id: Arc::new(RwLock::new(HashMap::new())),
            stalled: Arc::new(RwLock::new(HashSet::new())),
            retrievals: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            polls_to_finish: 2,
            never_completes: false,
            shutdowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every retrieval stays in progress forever.
    pub fn never_completes(mut self) -> Self {
        self.never_completes = true;
        self
    }

    pub fn with_polls_to_finish(mut self, polls: u32) -> Self {
        self.polls_to_finish = polls;
        self
    }

    /// A file produced by every retrieval.
    pub async fn add_file(&self, relative: impl Into<PathBuf>, content: &[u8]) {
        self.files
            .write()
            .await
            .push((relative.into(), content.to_vec()));
    }

    /// A file produced only by the retrieval of `transfer_id`.
    pub async fn add_file_for(
        &self,
        transfer_id: u64,
        relative: impl Into<PathBuf>,
        content: &[u8],
    ) {
        self.files_by_id
            .write()
            .await
            .entry(transfer_id)
            .or_default()
            .push((relative.into(), content.to_vec()));
    }

    /// The retrieval of `transfer_id` never finishes.
    pub async fn stall(&self, transfer_id: u64) {
        self.stalled.write().await.insert(transfer_id);
    }

    /// Configure the next retrieval to fail with the given error.
    pub async fn set_next_error(&self, error: TransferError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recorded_retrievals(&self) -> Vec<RecordedRetrieval> {
        self.retrievals.read().await.clone()
    }

    pub async fn retrieval_count(&self) -> usize {
        self.retrievals.read().await.len()
    }

    /// Shared counter of `shutdown` calls across all handles.
    pub fn shutdown_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.shutdowns)
    }
}

#[async_trait]
impl TransferClient for MockTransferClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn begin_retrieval(
        &self,
        descriptor: TransferDescriptor,
        work_dir: &Path,
    ) -> Result<Box<dyn TransferHandle>, TransferError> {
        let transfer_id = parse_mock_descriptor(descriptor.as_bytes());
        self.retrievals.write().await.push(RecordedRetrieval {
            transfer_id,
            work_dir: work_dir.to_path_buf(),
            timestamp: Utc::now(),
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let mut files = self.files.read().await.clone();
        if let Some(id) = transfer_id {
            if let Some(extra) = self.files_by_id.read().await.get(&id) {
                files.extend(extra.iter().cloned());
            }
        }

        tokio::fs::create_dir_all(work_dir).await?;
        let mut total = 0u64;
        let mut relative_paths = Vec::with_capacity(files.len());
        for (relative, content) in files {
            let path = work_dir.join(&relative);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &content).await?;
            total += content.len() as u64;
            relative_paths.push(relative);
        }

        let stalled = match transfer_id {
            Some(id) => self.stalled.read().await.contains(&id),
            None => false,
        };

        Ok(Box::new(MockTransferHandle {
            total: total.max(1),
            files: relative_paths,
            polls: AtomicU32::new(0),
            polls_to_finish: self.polls_to_finish,
            never_completes: self.never_completes || stalled,
            shutdowns: Arc::clone(&self.shutdowns),
        }))
    }
}

struct MockTransferHandle {
    total: u64,
    files: Vec<PathBuf>,
    polls: AtomicU32,
    polls_to_finish: u32,
    never_completes: bool,
    shutdowns: Arc<AtomicUsize>,
}

impl MockTransferHandle {
    fn finished(&self) -> bool {
        !self.never_completes && self.polls.load(Ordering::SeqCst) >= self.polls_to_finish
    }
}

#[async_trait]
impl TransferHandle for MockTransferHandle {
    fn bytes_completed(&self) -> u64 {
        if self.finished() {
            self.total
        } else {
            self.total / 2
        }
    }

    fn bytes_total(&self) -> u64 {
        self.total
    }

    fn is_finished(&self) -> bool {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.finished()
    }

    fn files(&self) -> Vec<PathBuf> {
        self.files.clone()
    }

    async fn await_metadata(&self, _timeout: Duration) -> Result<(), TransferError> {
        Ok(())
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mock implementation of the DescriptorSource trait.
#[derive(Debug, Default)]
pub struct MockDescriptorSource {
    /// HTTP status to fail with, per transfer id.
    failures: Arc<RwLock<HashMap<u64, u16>>>,
    /// Recorded fetches.
    fetched: Arc<RwLock<Vec<u64>>>,
    delay: Option<Duration>,
}

impl MockDescriptorSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch waits this long first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fetches for `transfer_id` fail with `status`.
    pub async fn fail_for(&self, transfer_id: u64, status: u16) {
        self.failures.write().await.insert(transfer_id, status);
    }

    pub async fn fetched_ids(&self) -> Vec<u64> {
        self.fetched.read().await.clone()
    }
}

#[async_trait]
impl DescriptorSource for MockDescriptorSource {
    async fn fetch(&self, job: &ReleaseJob) -> Result<Vec<u8>, FetchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.fetched.write().await.push(job.transfer_id);

        if let Some(status) = self.failures.read().await.get(&job.transfer_id) {
            return Err(FetchError::Status {
                url: format!("mock://download/{}.torrent", job.transfer_id),
                status: *status,
            });
        }
        Ok(mock_descriptor(job.transfer_id))
    }
}
