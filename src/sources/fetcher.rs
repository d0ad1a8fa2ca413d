use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::FetchConfig;
use crate::errors::{SourceError, SourceResult};
use crate::utils::url::UrlUtils;

/// Retrieves remote image bytes
///
/// Failures are reported once; nothing here retries.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> SourceResult<Bytes>;
}

/// reqwest-backed fetcher with bounded time and size
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpImageFetcher {
    pub fn from_config(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            timeout: config.timeout,
            max_bytes: config.max_bytes,
        })
    }

    fn describe(&self, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            format!("timed out after {}", humantime::format_duration(self.timeout))
        } else if error.is_connect() {
            format!("connection failed: {error}")
        } else {
            error.to_string()
        }
    }

    fn too_large(&self, url: &str, size: u64) -> SourceError {
        SourceError::fetch(
            UrlUtils::obfuscate_credentials(url),
            format!("response of {size} bytes exceeds limit of {} bytes", self.max_bytes),
        )
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> SourceResult<Bytes> {
        let safe_url = UrlUtils::obfuscate_credentials(url);
        debug!(url = %safe_url, "Fetching remote image");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::fetch(&safe_url, self.describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::fetch(
                &safe_url,
                format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        if let Some(length) = response.content_length()
            && length > self.max_bytes as u64
        {
            return Err(self.too_large(url, length));
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| SourceError::fetch(&safe_url, self.describe(&e)))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large(url, (body.len() + chunk.len()) as u64));
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url = %safe_url, bytes = body.len(), "Fetched remote image");
        Ok(body.freeze())
    }
}
