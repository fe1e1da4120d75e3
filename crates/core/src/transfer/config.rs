//! Configuration for the transfer client and the descriptor source.

use serde::{Deserialize, Serialize};

/// Settings for each embedded transfer session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Enable DHT for peer discovery.
    #[serde(default = "default_enable_dht")]
    pub enable_dht: bool,
}

fn default_enable_dht() -> bool {
    true
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            enable_dht: default_enable_dht(),
        }
    }
}

/// Where descriptor files are downloaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the release site; descriptors live under
    /// `<base_url>/download/<id>.torrent`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://nyaa.si".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl SourceConfig {
    /// Descriptor URL for a transfer id.
    pub fn descriptor_url(&self, transfer_id: u64) -> String {
        format!(
            "{}/download/{}.torrent",
            self.base_url.trim_end_matches('/'),
            transfer_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_url() {
        let config = SourceConfig::default();
        assert_eq!(
            config.descriptor_url(1234),
            "https://nyaa.si/download/1234.torrent"
        );

        let config = SourceConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.descriptor_url(5),
            "http://localhost:8080/download/5.torrent"
        );
    }
}
