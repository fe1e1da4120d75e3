//! Configuration for the placer module.

use serde::{Deserialize, Serialize};

/// Configuration for the file system placer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacerConfig {
    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Whether to try a rename before copying.
    #[serde(default = "default_true")]
    pub prefer_atomic_moves: bool,

    /// Whether to verify checksums after copying.
    #[serde(default)]
    pub verify_checksums: bool,

    /// Permissions for placed files (Unix only, octal).
    #[serde(default = "default_file_mode")]
    pub file_mode: u32,

    /// File extensions treated as videos, lowercase, without the dot.
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
}

fn default_buffer_size() -> usize {
    8 * 1024 * 1024 // 8 MB
}

fn default_true() -> bool {
    true
}

fn default_file_mode() -> u32 {
    0o644
}

fn default_video_extensions() -> Vec<String> {
    crate::metadata::VIDEO_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            prefer_atomic_moves: true,
            verify_checksums: false,
            file_mode: default_file_mode(),
            video_extensions: default_video_extensions(),
        }
    }
}

impl PlacerConfig {
    /// Enables or disables the rename attempt.
    pub fn with_atomic_moves(mut self, enabled: bool) -> Self {
        self.prefer_atomic_moves = enabled;
        self
    }

    /// Enables checksum verification.
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// Sets the buffer size for copies.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Whether `path` has one of the configured video extensions.
    pub fn is_video(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.video_extensions.iter().any(|v| *v == ext)
            })
            .unwrap_or(false)
    }
}
