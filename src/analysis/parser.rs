use crate::analysis::result::{validate, AnalysisResult};
use crate::error::{AnalyzerError, Result};
use crate::utils::excerpt;
use serde_json::Value;
use tracing::warn;

/// Length of the raw-reply excerpt carried by parse failures, in characters.
pub const EXCERPT_CHARS: usize = 500;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Pick the text most likely to hold the JSON object: a ```json block, else
/// the first fenced block, else everything; then narrow to the outermost braces.
pub fn extract_candidate(raw: &str) -> &str {
    let working = if let Some((_, rest)) = raw.split_once(JSON_FENCE) {
        rest.split(FENCE).next().unwrap_or(rest)
    } else if raw.contains(FENCE) {
        raw.split(FENCE).nth(1).unwrap_or(raw)
    } else {
        raw
    };

    let trimmed = working.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

pub fn parse(raw: &str) -> Result<AnalysisResult> {
    let candidate = extract_candidate(raw);

    let reason = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => return Ok(validate(&object)),
        Ok(other) => format!("expected a JSON object, found {}", json_kind(&other)),
        Err(e) => e.to_string(),
    };

    warn!("Failed to parse JSON response: {}", reason);
    Err(AnalyzerError::Parse {
        reason,
        excerpt: excerpt(raw, EXCERPT_CHARS),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::RiskLevel;

    #[test]
    fn test_json_fence_with_noise() {
        let raw = "noise ```json\n{\"relevance_score\":85,\"risk_assessment\":\"medium\"}\n``` trailing noise";
        let result = parse(raw).unwrap();

        assert_eq!(result.relevance_score, 85);
        assert_eq!(result.risk_assessment, RiskLevel::Medium);
        assert!(result.specific_matches.is_empty());
        assert!(result.key_insights.is_empty());
        assert!(result.visual_elements.is_empty());
        assert!(result.action_items.is_empty());
    }

    #[test]
    fn test_json_fence_preferred_over_earlier_plain_fence() {
        let raw = "```\nnot this\n```\nbut this:\n```json\n{\"relevance_score\": 10}\n```";
        assert_eq!(extract_candidate(raw), "{\"relevance_score\": 10}");
    }

    #[test]
    fn test_first_plain_fence() {
        let raw = "Here you go:\n```\n{\"relevance_score\": 40}\n```\nand\n```\n{\"relevance_score\": 99}\n```";
        assert_eq!(parse(raw).unwrap().relevance_score, 40);
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let raw = "```json\n{\"summary\": \"cut off\"}";
        assert_eq!(parse(raw).unwrap().summary, "cut off");
    }

    #[test]
    fn test_object_inside_prose() {
        let raw = "Sure! Based on the video {\"relevance_score\": 55, \"key_insights\": [\"rates {up}\"]} Hope that helps.";
        let result = parse(raw).unwrap();
        assert_eq!(result.relevance_score, 55);
        assert_eq!(result.key_insights, vec!["rates {up}"]);
    }

    #[test]
    fn test_no_braces_fails_with_excerpt() {
        let raw = "x".repeat(800);
        let err = parse(&raw).unwrap_err();
        let excerpt = err.excerpt().unwrap();
        assert_eq!(excerpt.chars().count(), 500);
        assert_eq!(excerpt, &raw[..500]);

        let short = "I could not analyze this video.";
        assert_eq!(parse(short).unwrap_err().excerpt(), Some(short));
    }

    #[test]
    fn test_braces_in_wrong_order_use_whole_text() {
        assert_eq!(extract_candidate("  } then {  "), "} then {");
        assert!(parse("} then {").is_err());
    }

    #[test]
    fn test_non_object_json_is_a_failure() {
        let err = parse("```json\n[1, 2, 3]\n```").unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_deterministic() {
        let inputs = [
            "prefix {\"relevance_score\": 12, \"summary\": \"s\"} suffix",
            "garbage without braces",
            "```json\n{broken json}\n```",
        ];
        for raw in inputs {
            let first = parse(raw);
            let second = parse(raw);
            match (first, second) {
                (Ok(a), Ok(b)) => assert_eq!(a, b),
                (Err(a), Err(b)) => {
                    assert_eq!(a.to_string(), b.to_string());
                    assert_eq!(a.excerpt(), b.excerpt());
                }
                _ => panic!("parse was not deterministic for {:?}", raw),
            }
        }
    }
}
