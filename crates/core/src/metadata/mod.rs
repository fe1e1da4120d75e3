//! Season / episode metadata index.
//!
//! The index is built by scanning a content root for episode description
//! files, persisted next to the content as `metadata-index.json`, and read
//! back through an explicit [`MetadataCache`] that callers own and pass
//! around.

mod builder;
mod error;
mod status;
mod store;
mod types;

pub use builder::{build, build_and_save, season_label, SHOW_DESCRIPTION_FILE, SPECIALS_LABEL};
pub use error::MetadataError;
pub use status::{
    count_videos_and_total, have_metadata, season_summaries, video_status, SeasonSummary,
    VideoStatus,
};
pub use store::{index_path, load, save, MetadataCache, INDEX_FILE_NAME};
pub use types::{EpisodeData, MetadataIndex, SeasonIndex};

/// Quarantine directory under the content root for files that could not be
/// classified or moved.
pub const STRAY_DIR: &str = "strayvideos";

/// Extensions treated as video files, lowercase.
pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4"];

/// Whether a path has one of the [`VIDEO_EXTENSIONS`], case-insensitive.
pub fn is_video_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
