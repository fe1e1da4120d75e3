//! Persistence and in-process caching of the metadata index.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use super::builder::build_and_save;
use super::error::MetadataError;
use super::types::MetadataIndex;

/// File name of the persisted index at the content root.
pub const INDEX_FILE_NAME: &str = "metadata-index.json";

pub fn index_path(root: &Path) -> PathBuf {
    root.join(INDEX_FILE_NAME)
}

/// Reads the persisted index.
///
/// A missing or unreadable file yields an empty index: with no metadata
/// nothing matches and every placement goes to quarantine.
pub fn load(root: &Path) -> MetadataIndex {
    let path = index_path(root);
    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No metadata index yet");
            return MetadataIndex::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read metadata index");
            return MetadataIndex::new();
        }
    };

    match serde_json::from_slice(&data) {
        Ok(index) => index,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupt metadata index, treating as empty");
            MetadataIndex::new()
        }
    }
}

/// Writes the index as pretty JSON, replacing any previous file.
pub fn save(root: &Path, index: &MetadataIndex) -> Result<(), MetadataError> {
    let path = index_path(root);
    let staging = root.join(format!(".{INDEX_FILE_NAME}.tmp"));
    let json = serde_json::to_string_pretty(index)?;

    fs::write(&staging, json).map_err(|e| MetadataError::io(&staging, e))?;
    fs::rename(&staging, &path).map_err(|e| MetadataError::io(&path, e))?;

    info!(path = %path.display(), "Saved metadata index");
    Ok(())
}

/// Build-once view of the index for one content root.
///
/// The first [`get`](Self::get) loads the persisted file; later calls return
/// the same snapshot for the lifetime of the cache even if the file changes.
#[derive(Debug)]
pub struct MetadataCache {
    root: PathBuf,
    index: OnceCell<Arc<MetadataIndex>>,
}

impl MetadataCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: OnceCell::new(),
        }
    }

    /// A cache that is already populated, skipping the disk entirely.
    pub fn with_index(root: impl Into<PathBuf>, index: MetadataIndex) -> Self {
        Self {
            root: root.into(),
            index: OnceCell::with_value(Arc::new(index)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_loaded(&self) -> bool {
        self.index.get().is_some()
    }

    pub fn get(&self) -> Arc<MetadataIndex> {
        Arc::clone(self.index.get_or_init(|| Arc::new(load(&self.root))))
    }

    /// Scans the content root, saves the result and returns it.
    ///
    /// The cached snapshot is only replaced if nothing was loaded yet.
    pub fn rebuild(&self) -> Result<Arc<MetadataIndex>, MetadataError> {
        let built = Arc::new(build_and_save(&self.root)?);
        if self.index.set(Arc::clone(&built)).is_err() {
            debug!("Metadata cache already populated, keeping existing snapshot");
        }
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapter::ChapterRange;
    use crate::metadata::{EpisodeData, SeasonIndex};
    use tempfile::TempDir;

    fn sample_index() -> MetadataIndex {
        let mut season = SeasonIndex::new(ChapterRange::new(1, 7).unwrap());
        season.episodes.insert(
            "1-7".to_string(),
            EpisodeData {
                title: "Romance Dawn".to_string(),
            },
        );
        let mut index = MetadataIndex::new();
        index.seasons.insert("Season 1".to_string(), season);
        index
    }

    #[test]
    fn test_load_missing_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(load(temp.path()).is_empty());
    }

    #[test]
    fn test_load_corrupt_is_empty() {
        let temp = TempDir::new().unwrap();
        fs::write(index_path(temp.path()), "{not json").unwrap();
        assert!(load(temp.path()).is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let index = sample_index();
        save(temp.path(), &index).unwrap();

        let raw = fs::read_to_string(index_path(temp.path())).unwrap();
        assert!(raw.contains("\"seasons\""));
        assert!(raw.contains('\n'));

        assert_eq!(load(temp.path()), index);
    }

    #[test]
    fn test_cache_loads_once() {
        let temp = TempDir::new().unwrap();
        let cache = MetadataCache::new(temp.path());
        assert!(!cache.is_loaded());
        assert!(cache.get().is_empty());
        assert!(cache.is_loaded());

        // Written after the first read; the cache keeps its snapshot.
        save(temp.path(), &sample_index()).unwrap();
        assert!(cache.get().is_empty());

        let fresh = MetadataCache::new(temp.path());
        assert_eq!(fresh.get().seasons.len(), 1);
    }

    #[test]
    fn test_cache_with_index() {
        let cache = MetadataCache::with_index("/unused", sample_index());
        assert!(cache.is_loaded());
        assert!(cache.get().season("Season 1").is_some());
    }
}
