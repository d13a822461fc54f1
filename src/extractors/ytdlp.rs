use crate::core::{FormatPreference, ProviderInfo, VideoFormat, VideoProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use url::Url;

/// Drives an installed `yt-dlp` executable. Handles any http(s) URL.
pub struct YtDlpProvider {
    binary: PathBuf,
}

impl YtDlpProvider {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!("Running {} {:?}", self.binary.display(), args);

        let output = Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Map yt-dlp's `--dump-single-json` output onto `ProviderInfo`.
    pub fn parse_info(info: &Value) -> ProviderInfo {
        let title = info
            .get("title")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let duration = info.get("duration").and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_f64().filter(|d| *d >= 0.0).map(|d| d.round() as u64))
        });

        let platform_hint = info
            .get("extractor_key")
            .or_else(|| info.get("extractor"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let formats = info
            .get("formats")
            .and_then(|v| v.as_array())
            .map(|formats| formats.iter().filter_map(Self::parse_format).collect())
            .unwrap_or_default();

        ProviderInfo {
            title,
            duration,
            platform_hint,
            formats,
        }
    }

    fn parse_format(format: &Value) -> Option<VideoFormat> {
        let url = format.get("url").and_then(|v| v.as_str())?;

        let codec = |key: &str| {
            format
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|c| *c != "none")
                .map(|c| c.to_string())
        };

        let filesize = format
            .get("filesize")
            .and_then(|v| v.as_u64())
            .or_else(|| format.get("filesize_approx").and_then(|v| v.as_u64()));

        Some(VideoFormat {
            format_id: format
                .get("format_id")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string(),
            url: url.to_string(),
            ext: format
                .get("ext")
                .and_then(|v| v.as_str())
                .unwrap_or("mp4")
                .to_string(),
            vcodec: codec("vcodec"),
            acodec: codec("acodec"),
            filesize,
            tbr: format.get("tbr").and_then(|v| v.as_f64()),
        })
    }
}

#[async_trait]
impl VideoProvider for YtDlpProvider {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn suitable(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
    }

    async fn extract_metadata(&self, url: &Url) -> Result<ProviderInfo> {
        let stdout = self
            .run(&[
                "--dump-single-json",
                "--skip-download",
                "--no-playlist",
                "--quiet",
                "--no-warnings",
                url.as_str(),
            ])
            .await?;

        let info: Value =
            serde_json::from_str(stdout.trim()).context("yt-dlp returned invalid JSON")?;
        Ok(Self::parse_info(&info))
    }

    async fn download(
        &self,
        url: &Url,
        preference: &FormatPreference,
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        let selector = preference.ytdlp_selector();
        let template = dest_dir.join("%(title)s.%(ext)s");
        let template = template.to_string_lossy().into_owned();

        let stdout = self
            .run(&[
                "-f",
                selector.as_str(),
                "-o",
                template.as_str(),
                "--no-playlist",
                "--quiet",
                "--no-warnings",
                "--no-simulate",
                "--print",
                "after_move:filepath",
                url.as_str(),
            ])
            .await?;

        let path = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .ok_or_else(|| anyhow::anyhow!("yt-dlp did not report a downloaded file"))?;

        Ok(PathBuf::from(path))
    }
}
