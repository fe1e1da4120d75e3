//! HTTP descriptor source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::config::SourceConfig;
use super::error::FetchError;
use super::traits::DescriptorSource;
use crate::release::ReleaseJob;

/// Downloads `<base_url>/download/<id>.torrent`.
pub struct HttpDescriptorSource {
    client: Client,
    config: SourceConfig,
}

impl HttpDescriptorSource {
    pub fn new(config: SourceConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("chapterbay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }
}

#[async_trait]
impl DescriptorSource for HttpDescriptorSource {
    async fn fetch(&self, job: &ReleaseJob) -> Result<Vec<u8>, FetchError> {
        let url = self.config.descriptor_url(job.transfer_id);
        debug!(transfer_id = job.transfer_id, url = %url, "Fetching descriptor");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout { url: url.clone() }
            } else {
                FetchError::Request {
                    url: url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| FetchError::Request {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        debug!(transfer_id = job.transfer_id, size = bytes.len(), "Descriptor fetched");
        Ok(bytes.to_vec())
    }
}
