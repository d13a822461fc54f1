use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const DEFAULT_SUMMARY: &str = "No summary available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl RiskLevel {
    /// Case-insensitive; anything unrecognized is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            _ => RiskLevel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub relevance_score: i64,
    pub specific_matches: Vec<String>,
    pub key_insights: Vec<String>,
    pub visual_elements: Vec<String>,
    pub action_items: Vec<String>,
    pub risk_assessment: RiskLevel,
    pub content_summary: String,
    pub summary: String,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            relevance_score: 0,
            specific_matches: Vec::new(),
            key_insights: Vec::new(),
            visual_elements: Vec::new(),
            action_items: Vec::new(),
            risk_assessment: RiskLevel::Unknown,
            content_summary: String::new(),
            summary: DEFAULT_SUMMARY.to_string(),
        }
    }
}

/// Map a decoded reply object onto `AnalysisResult`.
///
/// Total: absent or mistyped fields fall back to their defaults. Scores are
/// passed through without range clamping.
pub fn validate(object: &Map<String, Value>) -> AnalysisResult {
    let defaults = AnalysisResult::default();

    let relevance_score = object
        .get("relevance_score")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64)))
        .unwrap_or(defaults.relevance_score);

    let risk_assessment = object
        .get("risk_assessment")
        .and_then(|v| v.as_str())
        .map(RiskLevel::parse)
        .unwrap_or(defaults.risk_assessment);

    AnalysisResult {
        relevance_score,
        specific_matches: string_list(object, "specific_matches"),
        key_insights: string_list(object, "key_insights"),
        visual_elements: string_list(object, "visual_elements"),
        action_items: string_list(object, "action_items"),
        risk_assessment,
        content_summary: string_field(object, "content_summary").unwrap_or(defaults.content_summary),
        summary: string_field(object, "summary").unwrap_or(defaults.summary),
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn string_list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    object
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_object_gets_defaults() {
        let result = validate(&Map::new());
        assert_eq!(result, AnalysisResult::default());
        assert_eq!(result.summary, "No summary available");
        assert_eq!(result.risk_assessment, RiskLevel::Unknown);
    }

    #[test]
    fn test_full_object() {
        let result = validate(&object(json!({
            "relevance_score": 92,
            "specific_matches": ["AAPL"],
            "key_insights": ["Services revenue up"],
            "visual_elements": ["candlestick chart"],
            "action_items": ["Review position size"],
            "risk_assessment": "High",
            "content_summary": "Apple earnings recap",
            "summary": "Directly about your largest holding"
        })));

        assert_eq!(result.relevance_score, 92);
        assert_eq!(result.specific_matches, vec!["AAPL"]);
        assert_eq!(result.risk_assessment, RiskLevel::High);
        assert_eq!(result.content_summary, "Apple earnings recap");
    }

    #[test]
    fn test_mistyped_fields_fall_back() {
        let result = validate(&object(json!({
            "relevance_score": "very",
            "specific_matches": "AAPL",
            "key_insights": ["ok", 3, null],
            "risk_assessment": 5,
            "summary": ["not", "a", "string"]
        })));

        assert_eq!(result.relevance_score, 0);
        assert!(result.specific_matches.is_empty());
        assert_eq!(result.key_insights, vec!["ok"]);
        assert_eq!(result.risk_assessment, RiskLevel::Unknown);
        assert_eq!(result.summary, DEFAULT_SUMMARY);
    }

    #[test]
    fn test_scores_pass_through_unclamped() {
        assert_eq!(validate(&object(json!({"relevance_score": 140}))).relevance_score, 140);
        assert_eq!(validate(&object(json!({"relevance_score": -3}))).relevance_score, -3);
        assert_eq!(validate(&object(json!({"relevance_score": 72.6}))).relevance_score, 73);
    }

    #[test]
    fn test_unrecognized_risk_is_unknown() {
        assert_eq!(RiskLevel::parse("low/medium/high"), RiskLevel::Unknown);
        assert_eq!(RiskLevel::parse(" MEDIUM "), RiskLevel::Medium);
    }
}
