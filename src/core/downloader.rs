use anyhow::{Context, Result};
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Streams plain HTTP(S) media URLs to disk.
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Issue a HEAD request and return the declared `Content-Length`, if any.
    pub async fn content_length(&self, url: &str) -> Result<Option<u64>> {
        let response = self
            .client
            .head(url)
            .header("Accept", "video/*,*/*;q=0.8")
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("HEAD {} failed: HTTP {}", url, response.status());
        }

        Ok(response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok()))
    }

    /// Download `url` to `output_path`, returning the number of bytes written.
    pub async fn download_to(&self, url: &str, output_path: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .header("Accept", "*/*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Sec-Fetch-Dest", "video")
            .header("Sec-Fetch-Mode", "no-cors")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Failed to download {}: HTTP {}", url, status);
        }

        let total_size = response.content_length();
        let mut file = File::create(output_path)
            .await
            .with_context(|| format!("Failed to create {}", output_path.display()))?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        debug!(
            "Downloading {} bytes...",
            total_size.map_or("unknown".to_string(), |s| s.to_string())
        );

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            downloaded += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        info!("Downloaded {} bytes to: {}", downloaded, output_path.display());

        Ok(downloaded)
    }
}
