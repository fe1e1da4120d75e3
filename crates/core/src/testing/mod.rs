//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits a
//! download session depends on, so sessions can run end to end against a
//! temporary library without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use chapterbay_core::testing::{fixtures, MockDescriptorSource, MockTransferClient};
//!
//! let library = tempfile::TempDir::new()?;
//! fixtures::content_root(library.path(), &[("Season 2", "S02E01", "2", "1", "8-11")])?;
//! let transfer = MockTransferClient::new();
//! transfer.add_file("[One Pace][8-11] Orange Town.mkv", b"video").await;
//! ```

mod mock_placer;
mod mock_transfer;

pub use mock_placer::{MockPlacer, RecordedPlacement};
pub use mock_transfer::{
    mock_descriptor, parse_mock_descriptor, MockDescriptorSource, MockTransferClient,
    RecordedRetrieval,
};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::fs;
    use std::io;
    use std::path::Path;

    /// One episode description: season dir, file stem, `<season>`,
    /// `<episode>`, chapter range text.
    pub type EpisodeSpec<'a> = (&'a str, &'a str, &'a str, &'a str, &'a str);

    /// Writes an episode description file the metadata builder understands.
    pub fn write_episode(root: &Path, (dir, stem, season, episode, chapters): EpisodeSpec<'_>) -> io::Result<()> {
        let dir = root.join(dir);
        fs::create_dir_all(&dir)?;
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<episodedetails>\n  <title>{stem}</title>\n  <season>{season}</season>\n  <episode>{episode}</episode>\n  <plot>Manga Chapter(s): {chapters}\n\nAnime Episode(s): 1</plot>\n</episodedetails>\n"
        );
        fs::write(dir.join(format!("{stem}.nfo")), body)
    }

    /// Populates a content root with episode descriptions.
    pub fn content_root(root: &Path, episodes: &[EpisodeSpec<'_>]) -> io::Result<()> {
        for episode in episodes {
            write_episode(root, *episode)?;
        }
        Ok(())
    }

    /// A small two-season library.
    pub fn sample_library(root: &Path) -> io::Result<()> {
        content_root(
            root,
            &[
                ("Season 1", "One Pace - S01E01 - Romance Dawn", "1", "1", "1-7"),
                ("Season 2", "One Pace - S02E01 - Orange Town", "2", "1", "8-11"),
                ("Season 2", "One Pace - S02E02 - The Circus", "2", "2", "12-14"),
            ],
        )
    }
}
