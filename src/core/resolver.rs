use crate::core::{Platform, ProviderEngine, VideoMetadata};
use crate::error::AnalyzerError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Metadata plus the soft error that caused it to be defaulted, if any.
#[derive(Debug)]
pub struct Resolved {
    pub metadata: VideoMetadata,
    pub warning: Option<AnalyzerError>,
}

pub struct VideoInfoResolver {
    engine: Arc<ProviderEngine>,
}

impl VideoInfoResolver {
    pub fn new(engine: Arc<ProviderEngine>) -> Self {
        Self { engine }
    }

    /// Never fails: extraction errors yield `VideoMetadata::unknown` and a warning.
    pub async fn resolve(&self, url: &str) -> Resolved {
        match self.engine.extract_metadata(url).await {
            Ok(info) => {
                debug!("Platform hint for {}: {:?}", url, info.platform_hint);
                Resolved {
                    metadata: VideoMetadata {
                        title: info.title.unwrap_or_else(|| "Unknown".to_string()),
                        duration: info.duration.unwrap_or(0),
                        url: url.to_string(),
                        platform: Platform::from_url(url),
                    },
                    warning: None,
                }
            }
            Err(e) => {
                warn!("Error extracting video info: {:#}", e);
                Resolved {
                    metadata: VideoMetadata::unknown(url),
                    warning: Some(AnalyzerError::Metadata(format!("{:#}", e))),
                }
            }
        }
    }
}
