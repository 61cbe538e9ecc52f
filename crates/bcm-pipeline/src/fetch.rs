//! Yearly archive file retrieval.
//!
//! One remote resource per (dataset, variable, year). Transfers stream into
//! a `.partial` sibling of the destination and are renamed into place only
//! once the body has been fully written, so a failed transfer never leaves a
//! truncated yearly file behind. No retries: a failed year is reported and
//! the run moves on.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::error::{PipelineError, Result};

/// Retrieves a remote resource into a local file.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Transfer `url` to `dest`, overwriting it. Returns bytes written.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Whole-request timeout (yearly files are tens of MB)
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(600), // 10 minutes
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Streams archive files over HTTP(S).
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                PipelineError::InvalidConfig(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    async fn stream_to_file(&self, url: &str, partial: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::fetch(url, e))?;

        match response.status() {
            StatusCode::OK => {}
            status => return Err(PipelineError::fetch(url, format!("HTTP {}", status))),
        }

        let mut file = File::create(partial).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PipelineError::fetch(url, e))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;

        Ok(written)
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    dest.with_file_name(name)
}

#[async_trait]
impl ArchiveFetcher for HttpFetcher {
    #[instrument(skip(self, dest), fields(dest = %dest.display()))]
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(dest);
        debug!(url = %url, "Starting transfer");

        let written = match self.stream_to_file(url, &partial).await {
            Ok(0) => Err(PipelineError::fetch(url, "empty response body")),
            other => other,
        };

        let written = match written {
            Ok(bytes) => bytes,
            Err(e) => {
                fs::remove_file(&partial).await.ok();
                return Err(e);
            }
        };

        fs::rename(&partial, dest).await?;
        info!(url = %url, bytes = written, "Fetched yearly file");
        Ok(written)
    }
}
