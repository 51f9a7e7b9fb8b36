//! Prompt templates for section insights and the executive summary.

pub mod insights;
pub mod summary;

pub use insights::{build_prompt, build_section_prompt, INSIGHTS_SYSTEM};
pub use summary::{summary_user_prompt, SUMMARY_SYSTEM, SUMMARY_USER_TEMPLATE};

/// Pretty-printed JSON for embedding in a prompt. Serializing a `Value` cannot fail.
pub(crate) fn metrics_json(metrics: &serde_json::Value) -> String {
    serde_json::to_string_pretty(metrics).unwrap_or_else(|_| "{}".to_string())
}
