use crate::core::{Platform, ProviderEngine, VideoFormat};
use crate::error::{AnalyzerError, Result};
use crate::utils::{bytes_to_mb, mb_to_bytes, sanitize_filename};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{info, warn};

pub const DEFAULT_SIZE_BUDGET_MB: f64 = 20.0;

/// Which encoding to fetch: the smallest one declared under the budget,
/// otherwise the smallest one overall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatPreference {
    pub max_filesize_mb: f64,
}

impl FormatPreference {
    pub fn under_mb(max_filesize_mb: f64) -> Self {
        Self { max_filesize_mb }
    }

    /// The same policy as a yt-dlp `-f` selector.
    pub fn ytdlp_selector(&self) -> String {
        format!("worst[filesize<{}M]/worst", self.max_filesize_mb)
    }

    pub fn select<'a>(&self, formats: &'a [VideoFormat]) -> Option<&'a VideoFormat> {
        let budget = mb_to_bytes(self.max_filesize_mb);

        formats
            .iter()
            .filter(|f| f.filesize.is_some_and(|size| size < budget))
            .min_by_key(|f| f.filesize)
            .or_else(|| formats.iter().min_by_key(|f| size_rank(f)))
    }
}

// Declared sizes sort first, then lower bitrate.
fn size_rank(format: &VideoFormat) -> (bool, u64, u64) {
    (
        format.filesize.is_none(),
        format.filesize.unwrap_or(u64::MAX),
        format.tbr.map(|t| (t * 1000.0) as u64).unwrap_or(u64::MAX),
    )
}

/// A video file inside a private temp directory. Dropping it removes both.
#[derive(Debug)]
pub struct LocalVideo {
    path: PathBuf,
    size_mb: f64,
    staging: TempDir,
}

impl LocalVideo {
    /// Write uploaded bytes into a fresh staging directory.
    pub async fn stage(bytes: &[u8], filename: &str) -> Result<Self> {
        let staging = new_staging_dir()?;
        let path = staging.path().join(sanitize_filename(filename));
        tokio::fs::write(&path, bytes).await?;

        Ok(Self {
            path,
            size_mb: bytes_to_mb(bytes.len() as u64),
            staging,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_mb(&self) -> f64 {
        self.size_mb
    }

    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

#[derive(Debug)]
pub enum AcquiredContent {
    RemoteReference { uri: String },
    LocalFile(LocalVideo),
    Unavailable,
}

pub struct VideoAcquirer {
    engine: Arc<ProviderEngine>,
}

impl VideoAcquirer {
    pub fn new(engine: Arc<ProviderEngine>) -> Self {
        Self { engine }
    }

    /// Download `url` under `size_budget_mb`.
    ///
    /// Returns `Unavailable` when the finished file is over budget; the file
    /// is removed before returning. A failed download, or one that reports
    /// success without leaving a non-empty file, is an error.
    pub async fn acquire(&self, url: &str, size_budget_mb: f64) -> Result<AcquiredContent> {
        let staging = new_staging_dir()?;
        let preference = FormatPreference::under_mb(size_budget_mb);

        let path = self
            .engine
            .download(url, &preference, staging.path())
            .await
            .map_err(|e| AnalyzerError::Download(format!("{:#}", e)))?;

        let size = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                return Err(AnalyzerError::Download(format!(
                    "download reported success but {} does not exist",
                    path.display()
                )))
            }
        };
        if size == 0 {
            return Err(AnalyzerError::Download(format!(
                "downloaded file {} is empty",
                path.display()
            )));
        }

        let size_mb = bytes_to_mb(size);
        if size_mb > size_budget_mb {
            warn!(
                "Video is {:.1}MB (over {}MB limit), discarding download",
                size_mb, size_budget_mb
            );
            tokio::fs::remove_file(&path).await?;
            return Ok(AcquiredContent::Unavailable);
        }

        info!("Downloaded video ({:.1} MB)", size_mb);
        Ok(AcquiredContent::LocalFile(LocalVideo {
            path,
            size_mb,
            staging,
        }))
    }

    /// Decide how a URL reaches the analysis service: by reference when the
    /// platform allows it (unless downloads are preferred), otherwise
    /// downloaded. An over-budget download on such a platform falls back to
    /// the reference.
    pub async fn locate(
        &self,
        url: &str,
        size_budget_mb: f64,
        prefer_download: bool,
    ) -> Result<AcquiredContent> {
        let remote_ok = Platform::from_url(url).accepts_remote_reference();
        if remote_ok && !prefer_download {
            return Ok(AcquiredContent::RemoteReference {
                uri: url.to_string(),
            });
        }

        match self.acquire(url, size_budget_mb).await? {
            AcquiredContent::Unavailable if remote_ok => {
                warn!("Video is over {}MB, using the URL directly", size_budget_mb);
                Ok(AcquiredContent::RemoteReference {
                    uri: url.to_string(),
                })
            }
            other => Ok(other),
        }
    }
}

fn new_staging_dir() -> Result<TempDir> {
    Ok(tempfile::Builder::new().prefix("vidfolio-").tempdir()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(id: &str, filesize: Option<u64>, tbr: Option<f64>) -> VideoFormat {
        VideoFormat {
            format_id: id.to_string(),
            url: format!("https://example.com/{}.mp4", id),
            ext: "mp4".to_string(),
            vcodec: Some("h264".to_string()),
            acodec: Some("aac".to_string()),
            filesize,
            tbr,
        }
    }

    #[test]
    fn test_ytdlp_selector() {
        assert_eq!(
            FormatPreference::under_mb(20.0).ytdlp_selector(),
            "worst[filesize<20M]/worst"
        );
        assert_eq!(
            FormatPreference::under_mb(7.5).ytdlp_selector(),
            "worst[filesize<7.5M]/worst"
        );
    }

    #[test]
    fn test_select_smallest_under_budget() {
        let formats = vec![
            format("big", Some(mb_to_bytes(50.0)), Some(2000.0)),
            format("mid", Some(mb_to_bytes(12.0)), Some(800.0)),
            format("small", Some(mb_to_bytes(4.0)), Some(300.0)),
        ];
        let chosen = FormatPreference::under_mb(20.0).select(&formats).unwrap();
        assert_eq!(chosen.format_id, "small");
    }

    #[test]
    fn test_select_falls_back_to_overall_smallest() {
        let formats = vec![
            format("huge", Some(mb_to_bytes(90.0)), Some(4000.0)),
            format("large", Some(mb_to_bytes(40.0)), Some(1500.0)),
            format("undeclared", None, Some(100.0)),
        ];
        let chosen = FormatPreference::under_mb(20.0).select(&formats).unwrap();
        assert_eq!(chosen.format_id, "large");
    }

    #[test]
    fn test_select_without_sizes_uses_bitrate() {
        let formats = vec![
            format("hi", None, Some(900.0)),
            format("lo", None, Some(200.0)),
        ];
        let chosen = FormatPreference::under_mb(20.0).select(&formats).unwrap();
        assert_eq!(chosen.format_id, "lo");
        assert!(FormatPreference::under_mb(20.0).select(&[]).is_none());
    }

    #[tokio::test]
    async fn test_staged_upload_is_removed_on_drop() {
        let video = LocalVideo::stage(b"fake video bytes", "my:clip.mp4")
            .await
            .unwrap();
        let path = video.path().to_path_buf();
        let dir = video.staging_dir().to_path_buf();

        assert_eq!(path.file_name().unwrap(), "my_clip.mp4");
        assert_eq!(video.read().await.unwrap(), b"fake video bytes");

        drop(video);
        assert!(!path.exists());
        assert!(!dir.exists());
    }
}
