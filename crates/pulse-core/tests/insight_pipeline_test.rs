//! Integration test: insight generation pipeline end to end.
//!
//! Verifies that:
//! 1. Every section's fallback list declares exactly the types its prompt requests.
//! 2. Prompts are deterministic and an unknown section gets the sales prompt.
//! 3. A stubbed upstream reply flows through generator and hook unchanged.

use pulse_core::prompts::build_prompt;
use pulse_core::{
    fallback_for, fallback_insights, CompletionRequest, ContentBlock, HookState, InsightGenerator,
    InsightHook, InsightSource, LlmConfig, LlmError, Section, TextGenerator,
};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

#[test]
fn fallback_types_match_prompt_types() {
    for section in Section::ALL {
        let fallback = fallback_insights(section);
        assert!(!fallback.is_empty(), "{section} has no fallback");

        let got: BTreeSet<&str> = fallback.iter().map(|i| i.insight_type.as_str()).collect();
        let want: BTreeSet<&str> = section.insight_types().iter().copied().collect();
        assert_eq!(got, want, "{section}");
        assert_eq!(fallback.len(), section.insight_count(), "{section}");

        let prompt = build_prompt(section.as_str(), &json!({}));
        for t in section.insight_types() {
            assert!(prompt.contains(&format!("insight_type: \"{t}\"")), "{section}: {t}");
        }
        assert!(prompt.contains(&format!("exactly {} insights", section.insight_count())));
    }
}

#[test]
fn prompts_are_deterministic_and_alias_unknown_sections() {
    let metrics = json!({ "approvalRate": 59.5, "pullThrough": 40.2 });
    assert_eq!(build_prompt("funding", &metrics), build_prompt("funding", &metrics));
    assert_eq!(build_prompt("bogus_section", &json!({})), build_prompt("sales", &json!({})));
    assert_eq!(fallback_for("bogus_section"), fallback_for("sales"));
    assert!(build_prompt("sales", &json!({})).contains("{}"));
}

/// Records the prompt it was sent and replies with fixed text.
struct Recording {
    reply: String,
    seen: Mutex<Vec<CompletionRequest>>,
}

#[async_trait::async_trait]
impl TextGenerator for Recording {
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<ContentBlock>, LlmError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }
        Ok(vec![ContentBlock::Other, ContentBlock::text(&self.reply)])
    }
}

#[tokio::test]
async fn live_reply_reaches_the_hook() {
    let llm = Arc::new(Recording {
        reply: r#"```json
[
  {"insight_type": "bottleneck", "title": "Install backlog", "content": "18.5 days vs 15."},
  {"insight_type": "lag", "title": "Signing", "content": "4.5 days vs 3.8."},
  {"insight_type": "strength", "title": "Approvals", "content": "68.8% approval."}
]
```"#
            .to_string(),
        seen: Mutex::new(Vec::new()),
    });
    let generator = Arc::new(InsightGenerator::new(Some(llm.clone()), &LlmConfig::default()));
    let hook = InsightHook::new(generator, "projects", json!({ "expiringPct": 39 }));

    let result = hook.mount().await.expect("first mount runs");
    assert_eq!(result.source, InsightSource::Ai);
    assert_eq!(hook.state().await, HookState::Ready);
    assert_eq!(hook.insight("lag").await.map(|i| i.title), Some("Signing".to_string()));
    assert!(hook.message().await.is_none());

    let seen = llm.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].max_tokens, 1024);
    assert!(seen[0].prompt.contains("\"expiringPct\": 39"));
}

#[tokio::test]
async fn hook_without_credential_shows_fallback_and_toast() {
    let generator = Arc::new(InsightGenerator::new(None, &LlmConfig::default()));
    let hook = InsightHook::new(generator, "satisfaction", json!({}));
    hook.mount().await;
    assert_eq!(hook.source().await, Some(InsightSource::Fallback));
    assert!(hook.message().await.is_some());
    assert_eq!(hook.insights().await, fallback_insights(Section::Satisfaction));

    let refreshed = hook.refresh().await.expect("refresh from Ready runs");
    assert!(refreshed.is_fallback());
    assert_eq!(hook.state().await, HookState::Ready);
}
