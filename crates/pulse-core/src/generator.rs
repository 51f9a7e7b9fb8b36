//! Insight generator: prompt, upstream call, strict parse, fallback.
//!
//! `generate` never fails. Missing credentials short-circuit to the fallback list
//! without a network call; every other failure (transport, timeout, no text block,
//! bad JSON, wrong shape) is logged and mapped to the same fallback. No retries.

use crate::config::LlmConfig;
use crate::fallback::{fallback_insights, FALLBACK_SUMMARY};
use crate::hook::InsightService;
use crate::insight::{
    GenerationResult, Insight, InsightSource, SummaryResult, MSG_GENERATION_FAILED,
    MSG_NOT_CONFIGURED,
};
use crate::llm::{first_text, AnthropicClient, CompletionRequest, LlmError, TextGenerator};
use crate::prompts::{build_section_prompt, summary_user_prompt, INSIGHTS_SYSTEM, SUMMARY_SYSTEM};
use crate::records::StoredInsight;
use crate::section::Section;
use crate::store::MetricsStore;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("response contained no text block")]
    NoText,
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

struct Persistence {
    store: Arc<MetricsStore>,
    contractor_id: String,
}

pub struct InsightGenerator {
    llm: Option<Arc<dyn TextGenerator>>,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
    persist: Option<Persistence>,
}

impl InsightGenerator {
    /// `llm = None` means no credential: every call returns the fallback.
    pub fn new(llm: Option<Arc<dyn TextGenerator>>, cfg: &LlmConfig) -> Self {
        Self {
            llm,
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            timeout: Duration::from_secs(cfg.timeout_secs),
            persist: None,
        }
    }

    pub fn from_config(cfg: &LlmConfig) -> Self {
        let llm = AnthropicClient::from_config(cfg).map(|c| Arc::new(c) as Arc<dyn TextGenerator>);
        if llm.is_none() {
            tracing::warn!(target: "pulse::generator", "no API credential configured; insights will use fallbacks");
        }
        Self::new(llm, cfg)
    }

    /// Append successful AI insights to the store under `contractor_id`.
    pub fn with_persistence(mut self, store: Arc<MetricsStore>, contractor_id: &str) -> Self {
        self.persist = Some(Persistence {
            store,
            contractor_id: contractor_id.to_string(),
        });
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.llm.is_some()
    }

    /// Generate insights for `section_name`. Unknown names alias to sales.
    pub async fn generate(&self, section_name: &str, metrics: &Value) -> GenerationResult {
        self.generate_section(Section::resolve(section_name), metrics).await
    }

    pub async fn generate_section(&self, section: Section, metrics: &Value) -> GenerationResult {
        let Some(llm) = self.llm.as_deref() else {
            tracing::warn!(target: "pulse::generator", %section, "no credential, returning fallback");
            return GenerationResult::fallback(fallback_insights(section), MSG_NOT_CONFIGURED);
        };

        match self.try_generate(llm, section, metrics).await {
            Ok(insights) => {
                tracing::info!(target: "pulse::generator", %section, count = insights.len(), "insights generated");
                self.persist(section, &insights);
                GenerationResult::ai(insights)
            }
            Err(e) => {
                tracing::warn!(target: "pulse::generator", %section, error = %e, "generation failed, returning fallback");
                GenerationResult::fallback(fallback_insights(section), MSG_GENERATION_FAILED)
            }
        }
    }

    async fn try_generate(
        &self,
        llm: &dyn TextGenerator,
        section: Section,
        metrics: &Value,
    ) -> Result<Vec<Insight>, GenerationError> {
        let request = CompletionRequest {
            system: INSIGHTS_SYSTEM.to_string(),
            prompt: build_section_prompt(section, metrics),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let text = self.complete_text(llm, &request).await?;
        parse_insights(&text)
    }

    async fn complete_text(
        &self,
        llm: &dyn TextGenerator,
        request: &CompletionRequest,
    ) -> Result<String, GenerationError> {
        let blocks = tokio::time::timeout(self.timeout, llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;
        first_text(&blocks)
            .map(str::to_string)
            .ok_or(GenerationError::NoText)
    }

    fn persist(&self, section: Section, insights: &[Insight]) {
        let Some(p) = &self.persist else { return };
        let generated_at = chrono::Utc::now().timestamp_millis();
        for insight in insights {
            let row = StoredInsight {
                contractor_id: p.contractor_id.clone(),
                section: section.as_str().to_string(),
                insight_type: insight.insight_type.clone(),
                title: insight.title.clone(),
                content: insight.content.clone(),
                generated_at,
            };
            if let Err(e) = p.store.append_insight(&row) {
                tracing::warn!(target: "pulse::generator", %section, error = %e, "failed to persist insight");
                return;
            }
        }
    }

    /// Executive summary over the combined snapshot. Falls back to the canned summary.
    pub async fn generate_summary(&self, metrics: &Value) -> SummaryResult {
        let fallback = || SummaryResult {
            summary: FALLBACK_SUMMARY.to_string(),
            source: InsightSource::Fallback,
        };
        let Some(llm) = self.llm.as_deref() else {
            tracing::warn!(target: "pulse::generator", "no credential, returning fallback summary");
            return fallback();
        };

        let request = CompletionRequest {
            system: SUMMARY_SYSTEM.to_string(),
            prompt: summary_user_prompt(metrics),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        match self.complete_text(llm, &request).await {
            Ok(text) if !text.trim().is_empty() => SummaryResult {
                summary: text.trim().to_string(),
                source: InsightSource::Ai,
            },
            Ok(_) => {
                tracing::warn!(target: "pulse::generator", "empty summary, returning fallback");
                fallback()
            }
            Err(e) => {
                tracing::warn!(target: "pulse::generator", error = %e, "summary generation failed, returning fallback");
                fallback()
            }
        }
    }
}

#[async_trait::async_trait]
impl InsightService for InsightGenerator {
    async fn generate(&self, section: &str, metrics: &Value) -> GenerationResult {
        InsightGenerator::generate(self, section, metrics).await
    }

    async fn summary(&self, metrics: &Value) -> SummaryResult {
        self.generate_summary(metrics).await
    }
}

/// Remove a surrounding markdown fence (```` ``` ```` or ```` ```json ````), if any.
pub fn strip_code_fences(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse model text into insights. The whole reply is rejected on any shape violation.
pub fn parse_insights(text: &str) -> Result<Vec<Insight>, GenerationError> {
    let value: Value = serde_json::from_str(strip_code_fences(text))?;
    if !value.is_array() {
        return Err(GenerationError::Shape(format!(
            "expected a JSON array, got {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| GenerationError::Shape(e.to_string()))
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
