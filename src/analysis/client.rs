use crate::analysis::request::{AnalysisRequest, ContentPayload};
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

/// A multimodal model that answers a prompt about a video.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    fn name(&self) -> &'static str;
    async fn generate(&self, payload: &ContentPayload, prompt: &str) -> Result<String>;
}

pub struct AnalysisClient {
    service: Box<dyn AnalysisService>,
}

impl AnalysisClient {
    pub fn new(service: Box<dyn AnalysisService>) -> Self {
        Self { service }
    }

    /// One call to the service, no retries.
    pub async fn submit(&self, request: &AnalysisRequest) -> Result<String> {
        info!(
            "Submitting {:?} to {}",
            request.payload,
            self.service.name()
        );
        let text = self.service.generate(&request.payload, &request.prompt).await?;
        info!("Received {} characters from {}", text.len(), self.service.name());
        Ok(text)
    }
}
