use crate::analysis::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::core::acquirer::DEFAULT_SIZE_BUDGET_MB;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "vidfolio.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub size_budget_mb: f64,
    pub ytdlp_path: PathBuf,
    pub user_agent: String,
    pub download_timeout: u64,
    /// Download even when the platform could be analyzed by URL.
    pub prefer_download: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            size_budget_mb: DEFAULT_SIZE_BUDGET_MB,
            ytdlp_path: PathBuf::from("yt-dlp"),
            user_agent: format!("vidfolio/{}", env!("CARGO_PKG_VERSION")),
            download_timeout: 30,
            prefer_download: false,
        }
    }
}

impl Config {
    /// Load `path`, or `vidfolio.toml` when present, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = var("GEMINI_API_KEY").or_else(|| var("GOOGLE_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = var("VIDFOLIO_GEMINI_MODEL") {
            self.model = model;
        }
        if let Some(base) = var("VIDFOLIO_GEMINI_BASE_URL") {
            self.api_base_url = base;
        }
        if let Some(path) = var("VIDFOLIO_YTDLP") {
            self.ytdlp_path = PathBuf::from(path);
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !self.size_budget_mb.is_finite() || self.size_budget_mb <= 0.0 {
            anyhow::bail!("size_budget_mb must be a positive number");
        }
        Ok(())
    }

    pub fn require_api_key(&self) -> anyhow::Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Gemini API key missing: set GEMINI_API_KEY or api_key in {}",
                    DEFAULT_CONFIG_FILE
                )
            })
    }
}
