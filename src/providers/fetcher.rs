//! Downloads the raw feed into the local cache file.

use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("writing feed cache failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches the remote feed and atomically replaces the cache file.
pub struct FeedFetcher {
    client: reqwest::Client,
    url: String,
}

impl FeedFetcher {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("ratesd/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Streams the remote feed into `dest`.
    ///
    /// The body lands in a sibling `.partial` file which is renamed onto
    /// `dest` once complete, so `dest` only ever holds a full feed snapshot.
    /// On any failure the partial file is removed best-effort and the
    /// original error propagates.
    pub async fn download(&self, dest: &Path) -> Result<(), FetchError> {
        let partial = dest.with_extension("partial");
        match self.download_to(&partial, dest).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Err(cleanup) = fs::remove_file(&partial).await
                    && cleanup.kind() != std::io::ErrorKind::NotFound
                {
                    warn!(error = %cleanup, "Failed to remove partial feed download");
                }
                Err(err)
            }
        }
    }

    async fn download_to(&self, partial: &Path, dest: &Path) -> Result<(), FetchError> {
        debug!(url = %self.url, "Requesting feed");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::File::create(partial).await?;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        drop(file);

        fs::rename(partial, dest).await?;
        debug!(path = %dest.display(), "Feed cache updated");
        Ok(())
    }
}
