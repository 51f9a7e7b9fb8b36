//! Text-generation bridge: one request, one reply, no streaming.
//!
//! [`TextGenerator`] is the seam the insight generator talks to; [`AnthropicClient`] is
//! the reqwest implementation against the Messages API.

use crate::config::LlmConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Everything a single completion call carries.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// One block of a model reply. Only text blocks are used; anything else is kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

impl ContentBlock {
    pub fn text(s: &str) -> Self {
        ContentBlock::Text { text: s.to_string() }
    }
}

/// First text block of a reply, if any.
pub fn first_text(blocks: &[ContentBlock]) -> Option<&str> {
    blocks.iter().find_map(|b| match b {
        ContentBlock::Text { text } => Some(text.as_str()),
        ContentBlock::Other => None,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API key not configured")]
    MissingKey,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response parse failed: {0}")]
    Decode(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// External text-generation API.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<ContentBlock>, LlmError>;
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

/// Messages API client. Holds the credential it was constructed with.
pub struct AnthropicClient {
    api_key: String,
    api_url: String,
    model: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    /// Build from config. Returns `None` when no credential is configured.
    pub fn from_config(cfg: &LlmConfig) -> Option<Self> {
        let key = cfg.api_key.as_deref()?.trim();
        if key.is_empty() {
            return None;
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Some(Self {
            api_key: key.to_string(),
            api_url: cfg.api_url.clone(),
            model: cfg.model.clone(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl TextGenerator for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<ContentBlock>, LlmError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        let res = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::Decode(e.to_string()))?;
        Ok(parsed.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_mixed_blocks() {
        let raw = r#"{"content":[{"type":"tool_use","id":"x","name":"y","input":{}},{"type":"text","text":"hi"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.content.len(), 2);
        assert_eq!(first_text(&parsed.content), Some("hi"));
    }

    #[test]
    fn no_text_block() {
        assert_eq!(first_text(&[ContentBlock::Other]), None);
        assert_eq!(first_text(&[]), None);
    }

    #[test]
    fn blank_key_means_unconfigured() {
        let cfg = LlmConfig {
            api_key: Some("   ".into()),
            ..LlmConfig::default()
        };
        assert!(AnthropicClient::from_config(&cfg).is_none());
        let cfg = LlmConfig {
            api_key: Some("sk-test".into()),
            ..LlmConfig::default()
        };
        let client = AnthropicClient::from_config(&cfg).unwrap();
        assert_eq!(client.model(), LlmConfig::default().model);
    }
}
