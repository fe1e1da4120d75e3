//! Types for the placer module.

use std::path::PathBuf;

use serde::Serialize;

/// Where a file ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementKind {
    /// Resolved to a season/episode destination.
    Placed,
    /// The matcher found no episode; filed under the range's stray folder.
    Stray,
    /// The resolved destination could not be written; moved to a
    /// timestamped quarantine path instead.
    Quarantined,
}

impl PlacementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementKind::Placed => "placed",
            PlacementKind::Stray => "stray",
            PlacementKind::Quarantined => "quarantined",
        }
    }
}

/// Result of placing one file.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: PlacementKind,
    pub size_bytes: u64,
    /// SHA-256 of the copied bytes, when the copy path ran with
    /// verification enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// One line for the end-of-session report.
    pub summary: String,
}

/// Result of placing every video of one download.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchPlacement {
    pub outcomes: Vec<PlacementOutcome>,
    pub errors: Vec<String>,
    /// Number of video files that were offered.
    pub total: usize,
}

impl BatchPlacement {
    pub fn placed_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Aggregate one-liner, e.g. "All 3 files placed".
    pub fn summary(&self) -> String {
        let placed = self.placed_count();
        match (placed, self.total, self.errors.last()) {
            (_, 0, _) => "No video files found to place".to_string(),
            (0, _, Some(err)) => format!("Failed to place any files: {err}"),
            (0, _, None) => "No files could be placed".to_string(),
            (1, 1, _) => "1 file placed".to_string(),
            (p, t, _) if p == t => format!("All {t} files placed"),
            (p, t, _) => format!("{p}/{t} files placed"),
        }
    }

    /// Whether every offered file landed somewhere.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.placed_count() == self.total
    }
}
