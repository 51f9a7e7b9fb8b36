//! Contractor Pulse core library.
//! Metrics store, insight generation with static fallbacks, client hook, and report compiler.

pub mod client;
pub mod config;
pub mod fallback;
pub mod generator;
pub mod hook;
pub mod insight;
pub mod llm;
pub mod prompts;
pub mod records;
pub mod report;
pub mod report_data;
pub mod section;
pub mod seed;
pub mod snapshot;
pub mod store;
pub mod views;

pub use client::GatewayClient;
pub use config::{LlmConfig, PulseConfig};
pub use fallback::{fallback_for, fallback_insights, FALLBACK_SUMMARY};
pub use generator::{parse_insights, strip_code_fences, GenerationError, InsightGenerator};
pub use hook::{HookState, InsightHook, InsightService};
pub use insight::{
    find_insight, GenerationResult, Insight, InsightSource, SummaryResult, MSG_CONNECT_FAILED,
    MSG_GENERATION_FAILED, MSG_NOT_CONFIGURED,
};
pub use llm::{AnthropicClient, CompletionRequest, ContentBlock, LlmError, TextGenerator};
pub use report::{compile_report, Report, ReportContext};
pub use report_data::ReportData;
pub use section::{Section, UnknownSection};
pub use seed::{seed, SeedOutcome};
pub use store::{MetricsSource, MetricsStore, RecordFilter, StoreError, Table};
pub use views::{customer_notes, CustomerNote, DashboardFilters, SalesDetail};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
