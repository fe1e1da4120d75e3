//! File system placer implementation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info, warn};

use super::config::PlacerConfig;
use super::error::PlacerError;
use super::traits::Placer;
use super::types::{BatchPlacement, PlacementKind, PlacementOutcome};
use crate::chapter::ChapterRange;
use crate::matcher;
use crate::metadata::{MetadataIndex, STRAY_DIR};

/// File system based placer rooted at the library directory.
pub struct FsPlacer {
    root: PathBuf,
    config: PlacerConfig,
}

impl FsPlacer {
    /// Creates a new file system placer with the given configuration.
    pub fn new(root: impl Into<PathBuf>, config: PlacerConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Creates a placer with default configuration.
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        Self::new(root, PlacerConfig::default())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &PlacerConfig {
        &self.config
    }

    /// Places every video file found below `dir`.
    pub async fn place_directory(
        &self,
        dir: &Path,
        index: &MetadataIndex,
        range: &ChapterRange,
    ) -> BatchPlacement {
        let sources = collect_videos(dir, &self.config).await;
        self.place_all(&sources, index, range).await
    }

    /// Moves `source` to `destination`, leaving one of them intact whatever
    /// happens.
    ///
    /// A rename is tried first. Otherwise the data is copied to a unique
    /// staging file next to the destination and renamed over it, so a
    /// concurrent placement to the same path never observes a partial file.
    async fn safe_move(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(u64, Option<String>), PlacerError> {
        self.ensure_parent_dirs(destination).await?;

        if self.config.prefer_atomic_moves {
            match fs::rename(source, destination).await {
                Ok(()) => {
                    let size = fs::metadata(destination).await?.len();
                    return Ok((size, None));
                }
                Err(e) => {
                    debug!(
                        source = %source.display(),
                        error = %e,
                        "Rename failed, falling back to copy"
                    );
                }
            }
        }

        let mut staging = StagingFile::new(staging_path(destination));
        let (size, checksum) = self
            .copy_and_swap(source, staging.path(), destination)
            .await?;
        staging.disarm();

        // The destination is complete at this point; a leftover source is
        // only wasted space.
        if let Err(e) = fs::remove_file(source).await {
            warn!(source = %source.display(), error = %e, "Failed to remove source after copy");
        }

        Ok((size, checksum))
    }

    async fn copy_and_swap(
        &self,
        source: &Path,
        staging: &Path,
        destination: &Path,
    ) -> Result<(u64, Option<String>), PlacerError> {
        let (size, checksum) = self
            .copy_file(source, staging, self.config.verify_checksums)
            .await?;

        if let Some(expected) = &checksum {
            let actual = self.calculate_checksum(staging).await?;
            if *expected != actual {
                return Err(PlacerError::ChecksumMismatch {
                    path: destination.to_path_buf(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(self.config.file_mode);
            if let Err(e) = fs::set_permissions(staging, perms).await {
                debug!(path = %staging.display(), error = %e, "Failed to set permissions");
            }
        }

        fs::rename(staging, destination).await.map_err(|e| {
            PlacerError::move_failed(staging.to_path_buf(), destination.to_path_buf(), e)
        })?;

        Ok((size, checksum))
    }

    /// Copies a file with optional checksum calculation.
    async fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        calculate_checksum: bool,
    ) -> Result<(u64, Option<String>), PlacerError> {
        let source_file = File::open(source).await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let dest_file = File::create(destination).await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);

        let mut hasher = if calculate_checksum {
            Some(Sha256::new())
        } else {
            None
        };

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; self.config.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            if bytes_read == 0 {
                break;
            }

            if let Some(ref mut h) = hasher {
                h.update(&buffer[..bytes_read]);
            }

            writer.write_all(&buffer[..bytes_read]).await.map_err(|e| {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            total_bytes += bytes_read as u64;
        }

        writer.flush().await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;
        writer.get_ref().sync_all().await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let checksum = hasher.map(|h| format!("{:x}", h.finalize()));

        Ok((total_bytes, checksum))
    }

    /// SHA-256 of a file on disk.
    async fn calculate_checksum(&self, path: &Path) -> Result<String, PlacerError> {
        let file = File::open(path)
            .await
            .map_err(|e| PlacerError::ChecksumCalculationFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut hasher = Sha256::new();

        loop {
            let bytes_read =
                reader
                    .read(&mut buffer)
                    .await
                    .map_err(|e| PlacerError::ChecksumCalculationFailed {
                        path: path.to_path_buf(),
                        source: e,
                    })?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Creates parent directories for a path.
    async fn ensure_parent_dirs(&self, path: &Path) -> Result<(), PlacerError> {
        if let Some(parent) = path.parent() {
            if !parent.is_dir() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    PlacerError::DirectoryCreationFailed {
                        path: parent.to_path_buf(),
                        source: e,
                    }
                })?;
            }
        }
        Ok(())
    }

    /// `<root>/strayvideos/<stem>_<timestamp>_<suffix><ext>`.
    ///
    /// The random suffix keeps two quarantines of the same name within one
    /// second apart.
    fn quarantine_path(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());
        let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let mut name = OsString::from(format!("{stem}_{timestamp}_{}", &suffix[..8]));
        if let Some(ext) = source.extension() {
            name.push(".");
            name.push(ext);
        }
        self.root.join(STRAY_DIR).join(name)
    }

    fn summary(&self, kind: PlacementKind, source: &Path, destination: &Path) -> String {
        let file = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative = destination.strip_prefix(&self.root).unwrap_or(destination);
        let label = match kind {
            PlacementKind::Placed => "Placed",
            PlacementKind::Stray => "Stray",
            PlacementKind::Quarantined => "Quarantined",
        };
        format!("{label}: {file} -> {}", relative.display())
    }
}

/// Appends the source's extension to a resolved stem.
///
/// Stems routinely contain dots ("Dr. Kureha"), so `Path::with_extension`
/// would truncate them.
fn with_source_extension(stem: &Path, source: &Path) -> PathBuf {
    let mut path = stem.as_os_str().to_os_string();
    if let Some(ext) = source.extension() {
        path.push(".");
        path.push(ext);
    }
    PathBuf::from(path)
}

/// `.<name>.<uuid>.part` next to the destination.
fn staging_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = format!(".{name}.{}.part", uuid::Uuid::new_v4().simple());
    destination.with_file_name(staging)
}

/// A staging file that is removed when dropped unless the copy completed.
///
/// Covers both a failed copy and a copy future that is dropped mid-flight.
struct StagingFile {
    path: PathBuf,
    armed: bool,
}

impl StagingFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// The file was renamed into place; nothing to clean up.
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed staging file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove staging file"),
        }
    }
}

/// Every video file under `dir` according to `config`, sorted.
pub async fn collect_videos(dir: &Path, config: &PlacerConfig) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = match fs::read_dir(&current).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %current.display(), error = %e, "Failed to read directory");
                continue;
            }
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => pending.push(path),
                Ok(ft) if ft.is_file() && config.is_video(&path) => found.push(path),
                _ => {}
            }
        }
    }

    found.sort();
    found
}

#[async_trait]
impl Placer for FsPlacer {
    fn name(&self) -> &str {
        "fs"
    }

    async fn place(
        &self,
        source: &Path,
        index: &MetadataIndex,
        range: &ChapterRange,
    ) -> Result<Option<PlacementOutcome>, PlacerError> {
        if !fs::try_exists(source).await.unwrap_or(false) {
            debug!(source = %source.display(), "Source already gone, nothing to place");
            return Ok(None);
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| PlacerError::InvalidSource {
                path: source.to_path_buf(),
            })?
            .to_string_lossy()
            .into_owned();

        let resolution = matcher::resolve(&file_name, index, &self.root, range);
        let destination = with_source_extension(&resolution.destination_stem, source);
        let kind = if resolution.is_stray() {
            PlacementKind::Stray
        } else {
            PlacementKind::Placed
        };

        let (destination, kind, (size_bytes, checksum), reason) =
            match self.safe_move(source, &destination).await {
                Ok(moved) => (destination, kind, moved, None),
                Err(e) => {
                    warn!(
                        source = %source.display(),
                        destination = %destination.display(),
                        error = %e,
                        "Safe move failed, quarantining"
                    );
                    let fallback = self.quarantine_path(source);
                    match self.safe_move(source, &fallback).await {
                        Ok(moved) => {
                            (fallback, PlacementKind::Quarantined, moved, Some(e.to_string()))
                        }
                        Err(second) => {
                            return Err(PlacerError::QuarantineFailed {
                                path: source.to_path_buf(),
                                reason: format!("{e}; quarantine: {second}"),
                            });
                        }
                    }
                }
            };

        let mut summary = self.summary(kind, source, &destination);
        if let Some(reason) = reason {
            summary.push_str(&format!(" ({reason})"));
        }
        info!("{}", summary);

        Ok(Some(PlacementOutcome {
            source: source.to_path_buf(),
            destination,
            kind,
            size_bytes,
            checksum,
            summary,
        }))
    }

    async fn validate(&self) -> Result<(), PlacerError> {
        let meta = fs::metadata(&self.root).await?;
        if !meta.is_dir() {
            return Err(PlacerError::InvalidSource {
                path: self.root.clone(),
            });
        }
        Ok(())
    }
}
