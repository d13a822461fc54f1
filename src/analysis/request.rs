use crate::core::LocalVideo;
use crate::error::Result;
use crate::portfolio::Portfolio;
use std::fmt;

/// How the video reaches the analysis service.
#[derive(Clone, PartialEq)]
pub enum ContentPayload {
    /// A locator the service fetches itself.
    RemoteUri { uri: String },
    /// Raw video bytes sent with the request.
    InlineBytes { data: Vec<u8>, mime_type: String },
}

impl ContentPayload {
    pub fn remote(uri: impl Into<String>) -> Self {
        ContentPayload::RemoteUri { uri: uri.into() }
    }

    pub fn inline(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        ContentPayload::InlineBytes {
            data,
            mime_type: mime_type.into(),
        }
    }

    pub async fn from_local(video: &LocalVideo, mime_type: &str) -> Result<Self> {
        Ok(Self::inline(video.read().await?, mime_type))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ContentPayload::RemoteUri { .. })
    }
}

impl fmt::Debug for ContentPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentPayload::RemoteUri { uri } => {
                f.debug_struct("RemoteUri").field("uri", uri).finish()
            }
            ContentPayload::InlineBytes { data, mime_type } => f
                .debug_struct("InlineBytes")
                .field("len", &data.len())
                .field("mime_type", mime_type)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub prompt: String,
    pub payload: ContentPayload,
}

impl AnalysisRequest {
    pub fn build(payload: ContentPayload, portfolio: &Portfolio) -> Result<Self> {
        Ok(Self {
            prompt: build_prompt(portfolio)?,
            payload,
        })
    }
}

pub fn build_prompt(portfolio: &Portfolio) -> Result<String> {
    let investments = portfolio.to_prompt_block()?;

    Ok(format!(
        r#"Analyze this video for investment relevance based on the user's portfolio:

USER'S INVESTMENTS:
{investments}

Please analyze both visual and audio content and provide:
1. Relevance Score (0-100): How relevant is this content to their investments?
2. Specific Matches: Which of their investments are mentioned or related?
3. Key Insights: What specific information is relevant to their portfolio?
4. Visual Elements: Any charts, graphs, or visual data shown?
5. Action Items: Any suggested actions based on the content?
6. Risk Level: Is this promoting risky strategies?
7. Content Summary: Brief summary of what the video discusses

Focus on:
- Stock tickers, company names, sector mentions
- Price movements, technical analysis
- Market news and trends
- Investment strategies and advice
- Visual charts, graphs, or financial data

Respond ONLY with a single JSON object in this format:
{{
    "relevance_score": 0-100,
    "specific_matches": ["list of matching investments"],
    "key_insights": ["list of relevant insights"],
    "visual_elements": ["charts/graphs seen"],
    "action_items": ["suggested actions"],
    "risk_assessment": "low/medium/high",
    "content_summary": "brief summary of video content",
    "summary": "brief summary of relevance to user's portfolio"
}}
"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::{InvestmentType, PortfolioEntry};

    fn portfolio() -> Portfolio {
        let mut portfolio = Portfolio::new();
        portfolio
            .insert("TSLA", PortfolioEntry::new(InvestmentType::Stock, 2500.0, "EV bet").unwrap())
            .unwrap();
        portfolio
    }

    #[test]
    fn test_prompt_embeds_portfolio_and_schema() {
        let prompt = build_prompt(&portfolio()).unwrap();

        assert!(prompt.contains("\"TSLA\""));
        assert!(prompt.contains("EV bet"));
        for key in [
            "relevance_score",
            "specific_matches",
            "key_insights",
            "visual_elements",
            "action_items",
            "risk_assessment",
            "content_summary",
            "\"summary\"",
        ] {
            assert!(prompt.contains(key), "missing {}", key);
        }
        assert!(prompt.contains("7. Content Summary"));
        assert!(!prompt.contains("8."));
    }

    #[test]
    fn test_build_keeps_payload_variant() {
        let portfolio = portfolio();
        let before = portfolio.clone();

        let remote = AnalysisRequest::build(ContentPayload::remote("https://youtu.be/x"), &portfolio).unwrap();
        assert!(remote.payload.is_remote());

        let inline = AnalysisRequest::build(ContentPayload::inline(vec![1, 2, 3], "video/mp4"), &portfolio).unwrap();
        assert!(!inline.payload.is_remote());
        assert_eq!(remote.prompt, inline.prompt);
        assert_eq!(portfolio, before);
    }

    #[test]
    fn test_inline_debug_hides_bytes() {
        let payload = ContentPayload::inline(vec![0xAB; 64], "video/webm");
        let rendered = format!("{:?}", payload);
        assert!(rendered.contains("len: 64"));
        assert!(!rendered.contains("171"));
    }
}
