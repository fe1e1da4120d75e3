//! Trait definitions for the placer module.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use super::error::PlacerError;
use super::types::{BatchPlacement, PlacementOutcome};
use crate::chapter::ChapterRange;
use crate::metadata::MetadataIndex;

/// A placer that can move downloaded files to their library destinations.
#[async_trait]
pub trait Placer: Send + Sync {
    /// Returns the name of this placer implementation.
    fn name(&self) -> &str;

    /// Places one file recorded under `range`.
    ///
    /// Returns `Ok(None)` when `source` no longer exists, which happens when
    /// an earlier attempt already moved it.
    async fn place(
        &self,
        source: &Path,
        index: &MetadataIndex,
        range: &ChapterRange,
    ) -> Result<Option<PlacementOutcome>, PlacerError>;

    /// Validates that the placer is properly configured and ready.
    async fn validate(&self) -> Result<(), PlacerError>;

    /// Places each file in turn. One file failing does not stop the rest.
    async fn place_all(
        &self,
        sources: &[PathBuf],
        index: &MetadataIndex,
        range: &ChapterRange,
    ) -> BatchPlacement {
        self.place_each(sources, index, range, &|_: &PlacementOutcome| {})
            .await
    }

    /// Like [`place_all`](Placer::place_all), calling `on_placed` as soon as
    /// each file has landed.
    async fn place_each(
        &self,
        sources: &[PathBuf],
        index: &MetadataIndex,
        range: &ChapterRange,
        on_placed: &(dyn for<'o> Fn(&'o PlacementOutcome) + Send + Sync),
    ) -> BatchPlacement {
        let mut batch = BatchPlacement {
            total: sources.len(),
            ..Default::default()
        };

        for source in sources {
            match self.place(source, index, range).await {
                Ok(Some(outcome)) => {
                    on_placed(&outcome);
                    batch.outcomes.push(outcome);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(source = %source.display(), error = %e, "Placement failed");
                    batch.errors.push(e.to_string());
                }
            }
        }

        batch
    }
}
