//! Remote transfer of URL sources.
//!
//! [`Transfer`] is the seam between the saver and the network. The default
//! [`HttpTransfer`] streams the response body chunk by chunk into the
//! destination file, so large files never sit in memory.

use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::error::SaverError;

/// Errors raised while moving bytes from a remote source to disk
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransferError> for SaverError {
    fn from(err: TransferError) -> Self {
        SaverError::cannot_load(err.to_string())
    }
}

/// Fetches a URL into a local file
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Write the body behind `url` to `destination`, returning bytes written.
    ///
    /// May leave a partial file behind on error; callers clean up.
    async fn fetch_to(&self, url: &Url, destination: &Path) -> Result<u64, TransferError>;
}

/// reqwest-backed [`Transfer`]
#[derive(Debug, Clone)]
pub struct HttpTransfer {
    client: reqwest::Client,
}

impl HttpTransfer {
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Result<Self, SaverError> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|e| SaverError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transfer for HttpTransfer {
    async fn fetch_to(&self, url: &Url, destination: &Path) -> Result<u64, TransferError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = tokio::fs::File::create(destination).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;

        debug!(url = %url, bytes = written, "Transfer finished");
        Ok(written)
    }
}
