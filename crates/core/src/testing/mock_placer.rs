//! Mock placer for testing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::chapter::ChapterRange;
use crate::metadata::MetadataIndex;
use crate::placer::{PlacementKind, PlacementOutcome, Placer, PlacerError};

/// A recorded placement for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPlacement {
    pub source: PathBuf,
    pub range: ChapterRange,
    /// Whether the placement succeeded.
    pub success: bool,
}

/// Mock implementation of the Placer trait.
///
/// Never touches the file system: every file "lands" under
/// `/mock/library/<range>/<file name>`.
///
/// # Example
///
/// ```rust,ignore
/// use chapterbay_core::testing::MockPlacer;
///
/// let placer = MockPlacer::new();
/// placer.set_fail_all(true).await;
///
/// let placements = placer.recorded_placements().await;
/// assert!(placements.iter().all(|p| !p.success));
/// ```
#[derive(Debug, Default)]
pub struct MockPlacer {
    /// Recorded placements.
    placements: Arc<RwLock<Vec<RecordedPlacement>>>,
    /// If set, the next placement will fail with this error.
    next_error: Arc<RwLock<Option<PlacerError>>>,
    /// Every placement fails with a quarantine error.
    fail_all: Arc<RwLock<bool>>,
}

impl MockPlacer {
    /// Create a new mock placer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded placements.
    pub async fn recorded_placements(&self) -> Vec<RecordedPlacement> {
        self.placements.read().await.clone()
    }

    /// Get the number of placements attempted.
    pub async fn placement_count(&self) -> usize {
        self.placements.read().await.len()
    }

    /// Configure the next placement to fail with the given error.
    pub async fn set_next_error(&self, error: PlacerError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_fail_all(&self, fail: bool) {
        *self.fail_all.write().await = fail;
    }
}

#[async_trait]
impl Placer for MockPlacer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn place(
        &self,
        source: &Path,
        _index: &MetadataIndex,
        range: &ChapterRange,
    ) -> Result<Option<PlacementOutcome>, PlacerError> {
        let error = match self.next_error.write().await.take() {
            Some(error) => Some(error),
            None if *self.fail_all.read().await => Some(PlacerError::QuarantineFailed {
                path: source.to_path_buf(),
                reason: "mock failure".to_string(),
            }),
            None => None,
        };

        self.placements.write().await.push(RecordedPlacement {
            source: source.to_path_buf(),
            range: *range,
            success: error.is_none(),
        });

        if let Some(error) = error {
            return Err(error);
        }

        let file = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let destination = PathBuf::from("/mock/library")
            .join(range.to_string())
            .join(&file);

        Ok(Some(PlacementOutcome {
            source: source.to_path_buf(),
            summary: format!("Placed: {file} -> {}/{file}", range),
            destination,
            kind: PlacementKind::Placed,
            size_bytes: 0,
            checksum: None,
        }))
    }

    async fn validate(&self) -> Result<(), PlacerError> {
        Ok(())
    }
}
