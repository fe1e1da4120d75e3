//! Resolves a downloaded filename to its place in the library.
//!
//! Resolution walks every season whose range contains the recorded chapter
//! range and runs an ordered list of lookup strategies against each one. The
//! first title found wins; when nothing matches anywhere the file is sent to
//! the quarantine directory instead. Resolution never fails.

mod strategies;
mod types;

pub use strategies::{
    try_exact_range, try_filename_range, try_rough_chapter, Strategy, STRATEGIES,
};
pub use types::{MatchInput, MatchKind, Resolution};

use std::path::Path;

use tracing::debug;

use crate::chapter::ChapterRange;
use crate::metadata::{MetadataIndex, STRAY_DIR};

/// Destination path (without extension) for `filename`.
pub fn resolve(
    filename: &str,
    index: &MetadataIndex,
    root: &Path,
    original_range: &ChapterRange,
) -> Resolution {
    let file_name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    let input = MatchInput {
        filename: &file_name,
        original_range,
    };

    for (label, season) in index.candidate_seasons(original_range) {
        for &(strategy_name, strategy) in STRATEGIES {
            if let Some(title) = strategy(&input, label, season) {
                debug!(
                    filename = %file_name,
                    season = %label,
                    strategy = strategy_name,
                    title = %title,
                    "Resolved destination"
                );
                return Resolution {
                    destination_stem: root.join(label).join(title),
                    kind: MatchKind::Matched {
                        season: label.to_string(),
                        strategy: strategy_name,
                    },
                };
            }
        }
        debug!(filename = %file_name, season = %label, "No title in candidate season");
    }

    let stem = Path::new(&file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());
    debug!(filename = %file_name, range = %original_range, "No match, quarantining");

    Resolution {
        destination_stem: root
            .join(STRAY_DIR)
            .join(original_range.to_string())
            .join(stem),
        kind: MatchKind::Stray,
    }
}
