//! End-to-end analysis of one video against a portfolio.
//!
//! Stages run strictly in sequence: resolve, acquire (or stage an upload),
//! build the request, submit it once, parse the reply. Temp files live inside
//! [`LocalVideo`] values and disappear when those are dropped, whichever way
//! the invocation ends.

use crate::analysis::{parse, AnalysisClient, AnalysisRequest, AnalysisResult, ContentPayload, GeminiService};
use crate::config::Config;
use crate::core::acquirer::DEFAULT_SIZE_BUDGET_MB;
use crate::core::{
    AcquiredContent, Downloader, LocalVideo, ProviderEngine, VideoAcquirer, VideoInfoResolver,
    VideoMetadata,
};
use crate::error::{AnalyzerError, Result};
use crate::extractors::{DirectProvider, YtDlpProvider};
use crate::portfolio::Portfolio;
use crate::utils::{bytes_to_mb, mime_for_path};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct UploadedVideo {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedVideo {
    pub fn size_mb(&self) -> f64 {
        bytes_to_mb(self.bytes.len() as u64)
    }
}

#[derive(Debug, Clone)]
pub enum VideoInput {
    Url(String),
    Upload(UploadedVideo),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisMethod {
    RemoteReference,
    DownloadedInline,
    UploadedInline,
}

#[derive(Debug, Clone, Serialize)]
pub enum VideoSource {
    Url(VideoMetadata),
    Upload {
        filename: String,
        mime_type: String,
        size_mb: f64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub source: VideoSource,
    pub method: AnalysisMethod,
    pub result: AnalysisResult,
    pub warnings: Vec<String>,
}

pub struct Analyzer {
    resolver: VideoInfoResolver,
    acquirer: VideoAcquirer,
    client: AnalysisClient,
    size_budget_mb: f64,
    prefer_download: bool,
}

impl Analyzer {
    pub fn new(engine: Arc<ProviderEngine>, client: AnalysisClient) -> Self {
        Self {
            resolver: VideoInfoResolver::new(Arc::clone(&engine)),
            acquirer: VideoAcquirer::new(engine),
            client,
            size_budget_mb: DEFAULT_SIZE_BUDGET_MB,
            prefer_download: false,
        }
    }

    /// Direct links, then yt-dlp for everything else, analyzed by Gemini.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let downloader = Downloader::new(&config.user_agent, config.download_timeout)?;

        let mut engine = ProviderEngine::new();
        engine.register_provider(Box::new(DirectProvider::new(downloader)));
        engine.register_provider(Box::new(YtDlpProvider::new(config.ytdlp_path.clone())));

        let service = GeminiService::new(
            config.require_api_key()?,
            config.model.as_str(),
            config.api_base_url.as_str(),
        )?;

        Ok(Self::new(Arc::new(engine), AnalysisClient::new(Box::new(service)))
            .with_size_budget(config.size_budget_mb)
            .with_prefer_download(config.prefer_download))
    }

    pub fn with_size_budget(mut self, size_budget_mb: f64) -> Self {
        self.size_budget_mb = size_budget_mb;
        self
    }

    pub fn with_prefer_download(mut self, prefer_download: bool) -> Self {
        self.prefer_download = prefer_download;
        self
    }

    pub fn size_budget_mb(&self) -> f64 {
        self.size_budget_mb
    }

    pub async fn analyze(&self, input: VideoInput, portfolio: &Portfolio) -> Result<AnalysisReport> {
        match input {
            VideoInput::Url(url) => self.analyze_url(&url, portfolio).await,
            VideoInput::Upload(upload) => self.analyze_upload(upload, portfolio).await,
        }
    }

    pub async fn analyze_url(&self, url: &str, portfolio: &Portfolio) -> Result<AnalysisReport> {
        let resolved = self.resolver.resolve(url).await;
        let mut warnings: Vec<String> = resolved.warning.iter().map(|w| w.to_string()).collect();
        let metadata = resolved.metadata;

        info!(
            "Video: {} ({}s, {})",
            metadata.title, metadata.duration, metadata.platform
        );

        let content = self
            .acquirer
            .locate(url, self.size_budget_mb, self.prefer_download)
            .await?;

        let (payload, method) = match content {
            AcquiredContent::RemoteReference { uri } => {
                if self.prefer_download {
                    warnings.push(format!(
                        "Video is over the {}MB limit. Using the URL directly.",
                        self.size_budget_mb
                    ));
                }
                (ContentPayload::remote(uri), AnalysisMethod::RemoteReference)
            }
            AcquiredContent::LocalFile(video) => {
                info!("Sending {:.1} MB inline", video.size_mb());
                let payload = ContentPayload::from_local(&video, mime_for_path(video.path())).await?;
                (payload, AnalysisMethod::DownloadedInline)
            }
            AcquiredContent::Unavailable => {
                return Err(AnalyzerError::SizeBudgetExceeded {
                    budget_mb: self.size_budget_mb,
                })
            }
        };

        let result = self.run(payload, portfolio).await?;
        Ok(AnalysisReport {
            source: VideoSource::Url(metadata),
            method,
            result,
            warnings,
        })
    }

    /// Analyze uploaded bytes. Rejected before any work when over the size budget.
    pub async fn analyze_upload(
        &self,
        upload: UploadedVideo,
        portfolio: &Portfolio,
    ) -> Result<AnalysisReport> {
        let size_mb = upload.size_mb();
        if size_mb > self.size_budget_mb {
            return Err(AnalyzerError::UploadTooLarge {
                size_mb,
                budget_mb: self.size_budget_mb,
            });
        }

        let staged = LocalVideo::stage(&upload.bytes, &upload.filename).await?;
        let mime_type = if upload.mime_type.trim().is_empty() {
            mime_for_path(staged.path()).to_string()
        } else {
            upload.mime_type.trim().to_string()
        };
        info!("Staged upload {} ({:.1} MB, {})", upload.filename, size_mb, mime_type);

        let payload = ContentPayload::from_local(&staged, &mime_type).await?;
        let result = self.run(payload, portfolio).await?;

        Ok(AnalysisReport {
            source: VideoSource::Upload {
                filename: upload.filename,
                mime_type,
                size_mb,
            },
            method: AnalysisMethod::UploadedInline,
            result,
            warnings: Vec::new(),
        })
    }

    async fn run(&self, payload: ContentPayload, portfolio: &Portfolio) -> Result<AnalysisResult> {
        let request = AnalysisRequest::build(payload, portfolio)?;
        let raw = self.client.submit(&request).await?;

        parse(&raw).inspect_err(|e| warn!("Discarding unparseable reply: {}", e))
    }
}
