//! Feed download

use crate::error::Result;
use std::path::Path;
use std::time::Duration;

/// Downloads the feed over HTTP, blocking the caller
pub struct FeedFetcher {
    url: String,
    timeout: Duration,
}

impl FeedFetcher {
    /// Create a fetcher for `url` with a request timeout
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            timeout,
        }
    }

    /// Feed location
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the whole feed body.
    ///
    /// Runs on a private current-thread runtime so the client and its
    /// connections never outlive the call.
    pub fn fetch(&self) -> Result<Vec<u8>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        runtime.block_on(self.fetch_async())
    }

    async fn fetch_async(&self) -> Result<Vec<u8>> {
        tracing::info!("Downloading feed from {}", self.url);

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("scimagojr/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let response = client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;

        tracing::debug!("Downloaded {} bytes from {}", bytes.len(), self.url);
        Ok(bytes.to_vec())
    }
}

/// Keep a copy of the downloaded feed on disk
pub fn save_download(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    tracing::debug!("Saved feed to {:?}", path);
    Ok(())
}
