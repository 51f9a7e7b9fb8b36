//! Insight types shared by the generator, the gateway, the hook, and the report.

use serde::{Deserialize, Serialize};

/// One short advisory tied to a section. `insight_type` routes it to a card slot.
///
/// Deserialization is strict: all three fields must be present strings, so a model
/// reply with a malformed element fails as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub insight_type: String,
    pub title: String,
    pub content: String,
}

impl Insight {
    pub fn new(insight_type: &str, title: &str, content: &str) -> Self {
        Self {
            insight_type: insight_type.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        }
    }
}

/// Provenance of a generation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSource {
    Ai,
    Fallback,
}

/// Message returned when no credential is configured.
pub const MSG_NOT_CONFIGURED: &str = "ANTHROPIC_API_KEY not configured. Showing default insights.";
/// Message returned when a live generation failed.
pub const MSG_GENERATION_FAILED: &str = "AI generation failed. Showing default insights.";
/// Message returned by the HTTP client when the gateway is unreachable.
pub const MSG_CONNECT_FAILED: &str = "Failed to connect to AI service.";

/// Result of one insight generation attempt. Always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub insights: Vec<Insight>,
    pub source: InsightSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GenerationResult {
    pub fn ai(insights: Vec<Insight>) -> Self {
        Self {
            insights,
            source: InsightSource::Ai,
            message: None,
        }
    }

    pub fn fallback(insights: Vec<Insight>, message: &str) -> Self {
        Self {
            insights,
            source: InsightSource::Fallback,
            message: Some(message.to_string()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == InsightSource::Fallback
    }
}

/// Result of one executive-summary generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub source: InsightSource,
}

/// First insight with the given type, if any.
pub fn find_insight<'a>(insights: &'a [Insight], insight_type: &str) -> Option<&'a Insight> {
    insights.iter().find(|i| i.insight_type == insight_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_serializes_lowercase() {
        let r = GenerationResult::ai(vec![]);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["source"], "ai");
        assert!(json.get("message").is_none());

        let f = GenerationResult::fallback(vec![], MSG_GENERATION_FAILED);
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["source"], "fallback");
        assert_eq!(json["message"], MSG_GENERATION_FAILED);
    }

    #[test]
    fn missing_field_is_rejected() {
        let bad = r#"[{"insight_type":"performance","title":"X"}]"#;
        assert!(serde_json::from_str::<Vec<Insight>>(bad).is_err());
    }

    #[test]
    fn find_returns_first_match() {
        let list = vec![
            Insight::new("trend", "A", "a"),
            Insight::new("trend", "B", "b"),
        ];
        assert_eq!(find_insight(&list, "trend").map(|i| i.title.as_str()), Some("A"));
        assert!(find_insight(&list, "installation").is_none());
    }
}
