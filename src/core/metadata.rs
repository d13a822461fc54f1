use serde::{Deserialize, Serialize};
use std::fmt;

/// Lightweight description of a video, resolved without downloading it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub duration: u64,
    pub url: String,
    pub platform: Platform,
}

impl VideoMetadata {
    pub fn unknown(url: &str) -> Self {
        Self {
            title: "Unknown".to_string(),
            duration: 0,
            url: url.to_string(),
            platform: Platform::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Platform {
    YouTube,
    Other,
    #[default]
    Unknown,
}

impl Platform {
    pub fn from_url(url: &str) -> Self {
        if url.contains("youtube.com") || url.contains("youtu.be") {
            Platform::YouTube
        } else {
            Platform::Other
        }
    }

    /// Whether the analysis service can fetch videos from this platform by URL alone.
    pub fn accepts_remote_reference(&self) -> bool {
        matches!(self, Platform::YouTube)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::YouTube => "YouTube",
            Platform::Other => "Other",
            Platform::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// What a provider reports about a URL before anything is downloaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub title: Option<String>,
    pub duration: Option<u64>,
    pub platform_hint: Option<String>,
    pub formats: Vec<VideoFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoFormat {
    pub format_id: String,
    pub url: String,
    pub ext: String,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub filesize: Option<u64>,
    pub tbr: Option<f64>, // total bitrate
}
