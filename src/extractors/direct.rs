use crate::core::{Downloader, FormatPreference, ProviderInfo, VideoFormat, VideoProvider};
use crate::utils::sanitize_filename;
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use url::Url;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi", "flv", "wmv", "3gp", "m4v"];

/// Plain links to a video file, fetched over HTTP without an extractor.
pub struct DirectProvider {
    downloader: Downloader,
}

impl DirectProvider {
    pub fn new(downloader: Downloader) -> Self {
        Self { downloader }
    }

    fn file_name(url: &Url) -> Option<&str> {
        url.path_segments()?.next_back().filter(|s| !s.is_empty())
    }

    fn extension(url: &Url) -> Option<String> {
        let name = Self::file_name(url)?;
        let (_, ext) = name.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }
}

#[async_trait]
impl VideoProvider for DirectProvider {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn suitable(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && Self::extension(url).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
    }

    async fn extract_metadata(&self, url: &Url) -> Result<ProviderInfo> {
        let filesize = self.downloader.content_length(url.as_str()).await?;
        let title = Self::file_name(url)
            .map(|name| name.rsplit_once('.').map_or(name, |(stem, _)| stem))
            .map(|stem| stem.to_string());

        Ok(ProviderInfo {
            title,
            duration: None,
            platform_hint: Some("direct".to_string()),
            formats: vec![VideoFormat {
                format_id: "direct".to_string(),
                url: url.to_string(),
                ext: Self::extension(url).unwrap_or_else(|| "mp4".to_string()),
                vcodec: None,
                acodec: None,
                filesize,
                tbr: None,
            }],
        })
    }

    async fn download(
        &self,
        url: &Url,
        preference: &FormatPreference,
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        // A direct link has exactly one encoding; the preference only matters for logging.
        tracing::debug!(
            "Direct download of {} (budget {}MB)",
            url,
            preference.max_filesize_mb
        );

        let name = Self::file_name(url).unwrap_or("video.mp4");
        let output_path = dest_dir.join(sanitize_filename(name));
        self.downloader.download_to(url.as_str(), &output_path).await?;

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> DirectProvider {
        DirectProvider::new(Downloader::new("vidfolio-test", 5).unwrap())
    }

    #[test]
    fn test_suitable_for_video_files() {
        let provider = provider();
        assert!(provider.suitable(&Url::parse("https://cdn.example.com/a/clip.MP4").unwrap()));
        assert!(provider.suitable(&Url::parse("http://example.com/talk.webm?sig=1").unwrap()));
        assert!(!provider.suitable(&Url::parse("https://www.youtube.com/watch?v=abc").unwrap()));
        assert!(!provider.suitable(&Url::parse("https://example.com/").unwrap()));
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_metadata() {
        let provider = provider();
        let url = Url::parse("http://127.0.0.1:9/clip.mp4").unwrap();
        assert!(provider.extract_metadata(&url).await.is_err());
    }
}
