//! Google Gemini backend over the Generative Language REST API.
//!
//! Remote references go out as `fileData` parts (the service fetches the URL
//! itself, which works for YouTube links); local videos go out base64-encoded
//! as `inlineData`. The prompt is always the last part.

use crate::analysis::client::AnalysisService;
use crate::analysis::request::ContentPayload;
use crate::error::{AnalyzerError, Result};
use crate::utils::excerpt;
use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart {
    FileData {
        #[serde(rename = "fileUri")]
        file_uri: String,
    },
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: String,
        data: String,
    },
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

pub struct GeminiService {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiService {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("vidfolio/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        let model = model.into();
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.trim_start_matches("models/").to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_body(payload: &ContentPayload, prompt: &str) -> GeminiRequest {
        let content_part = match payload {
            ContentPayload::RemoteUri { uri } => RequestPart::FileData {
                file_uri: uri.clone(),
            },
            ContentPayload::InlineBytes { data, mime_type } => RequestPart::InlineData {
                mime_type: mime_type.clone(),
                data: base64::engine::general_purpose::STANDARD.encode(data),
            },
        };

        GeminiRequest {
            contents: vec![RequestContent {
                parts: vec![content_part, RequestPart::Text(prompt.to_string())],
            }],
        }
    }

    fn response_text(response: GeminiResponse) -> Result<String> {
        let text: Vec<String> = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if !text.is_empty() {
            return Ok(text.concat());
        }

        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("request blocked: {}", r))
            .unwrap_or_else(|| "malformed API response: no text in reply".to_string());
        Err(AnalyzerError::Transport(reason))
    }
}

#[async_trait]
impl AnalysisService for GeminiService {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn generate(&self, payload: &ContentPayload, prompt: &str) -> Result<String> {
        let body = Self::request_body(payload, prompt);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalyzerError::Transport(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::Transport(format!(
                "service returned {}: {}",
                status,
                excerpt(error_text.trim(), 300)
            )));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AnalyzerError::Transport(format!("malformed API response: {}", e)))?;

        Self::response_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_request_body() {
        let body = GeminiService::request_body(
            &ContentPayload::remote("https://www.youtube.com/watch?v=abc"),
            "analyze",
        );
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value,
            json!({"contents": [{"parts": [
                {"fileData": {"fileUri": "https://www.youtube.com/watch?v=abc"}},
                {"text": "analyze"}
            ]}]})
        );
    }

    #[test]
    fn test_inline_request_body() {
        let body = GeminiService::request_body(
            &ContentPayload::inline(b"abc".to_vec(), "video/mp4"),
            "analyze",
        );
        let value = serde_json::to_value(&body).unwrap();
        let inline = &value["contents"][0]["parts"][0]["inlineData"];

        assert_eq!(inline["mimeType"], "video/mp4");
        assert_eq!(inline["data"], "YWJj");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]
        }))
        .unwrap();
        assert_eq!(GeminiService::response_text(response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_blocked_response_is_transport_error() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let err = GeminiService::response_text(response).unwrap_err();
        assert!(matches!(err, AnalyzerError::Transport(ref m) if m.contains("SAFETY")));
    }

    #[test]
    fn test_endpoint_normalizes_model_and_base() {
        let service = GeminiService::new("key", "models/gemini-2.5-flash", "http://localhost:8080/").unwrap();
        assert_eq!(
            service.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let service = GeminiService::new("key", DEFAULT_MODEL, "http://127.0.0.1:9").unwrap();
        let err = service
            .generate(&ContentPayload::remote("https://youtu.be/x"), "p")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Transport(_)));
    }
}
