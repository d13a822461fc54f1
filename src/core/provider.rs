use crate::core::{FormatPreference, ProviderInfo};
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use url::Url;

/// A source of video metadata and downloads for some set of URLs.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn suitable(&self, url: &Url) -> bool;
    async fn extract_metadata(&self, url: &Url) -> Result<ProviderInfo>;

    /// Download one encoding of `url` into `dest_dir` and return the written file.
    async fn download(
        &self,
        url: &Url,
        preference: &FormatPreference,
        dest_dir: &Path,
    ) -> Result<PathBuf>;
}

pub struct ProviderEngine {
    pub providers: Vec<Box<dyn VideoProvider>>,
}

impl ProviderEngine {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Providers are tried in registration order; register catch-alls last.
    pub fn register_provider(&mut self, provider: Box<dyn VideoProvider>) {
        self.providers.push(provider);
    }

    pub fn provider_for(&self, url: &Url) -> Result<&dyn VideoProvider> {
        self.providers
            .iter()
            .find(|p| p.suitable(url))
            .map(|p| p.as_ref())
            .ok_or_else(|| anyhow::anyhow!("No suitable provider found for URL: {}", url))
    }

    pub async fn extract_metadata(&self, url: &str) -> Result<ProviderInfo> {
        let parsed_url = Url::parse(url)?;
        let provider = self.provider_for(&parsed_url)?;
        tracing::debug!("Resolving {} with {}", url, provider.name());
        provider.extract_metadata(&parsed_url).await
    }

    pub async fn download(
        &self,
        url: &str,
        preference: &FormatPreference,
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        let parsed_url = Url::parse(url)?;
        let provider = self.provider_for(&parsed_url)?;
        tracing::debug!("Downloading {} with {}", url, provider.name());
        provider.download(&parsed_url, preference, dest_dir).await
    }
}

impl Default for ProviderEngine {
    fn default() -> Self {
        Self::new()
    }
}
