//! HTTP client for the gateway's insight endpoints.

use crate::fallback::{fallback_for, FALLBACK_SUMMARY};
use crate::hook::InsightService;
use crate::insight::{GenerationResult, InsightSource, SummaryResult, MSG_CONNECT_FAILED};
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Clone)]
pub struct GatewayClient {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: serde::de::DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, reqwest::Error> {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
    }
}

#[async_trait::async_trait]
impl InsightService for GatewayClient {
    async fn generate(&self, section: &str, metrics: &Value) -> GenerationResult {
        let body = json!({ "section": section, "metrics": metrics });
        match self.post::<GenerationResult>("/api/ai", &body).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(target: "pulse::client", section, error = %e, "gateway unreachable, using fallback");
                GenerationResult::fallback(fallback_for(section), MSG_CONNECT_FAILED)
            }
        }
    }

    async fn summary(&self, metrics: &Value) -> SummaryResult {
        let body = json!({ "metrics": metrics });
        match self.post::<SummaryResult>("/api/ai/summary", &body).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(target: "pulse::client", error = %e, "gateway unreachable, using fallback summary");
                SummaryResult {
                    summary: FALLBACK_SUMMARY.to_string(),
                    source: InsightSource::Fallback,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::fallback_insights;
    use crate::section::Section;

    #[tokio::test]
    async fn unreachable_gateway_yields_fallback() {
        // port 9 (discard) is not expected to serve HTTP
        let client = GatewayClient::new("http://127.0.0.1:9/", Duration::from_millis(500));
        assert_eq!(client.base_url(), "http://127.0.0.1:9");
        let res = client.generate("benchmarks", &json!({})).await;
        assert_eq!(res.source, InsightSource::Fallback);
        assert_eq!(res.message.as_deref(), Some(MSG_CONNECT_FAILED));
        assert_eq!(res.insights, fallback_insights(Section::Benchmarks));
    }
}
