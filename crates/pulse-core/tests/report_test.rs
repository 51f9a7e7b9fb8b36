//! Integration test: report compilation over a seeded store.
//!
//! Verifies that:
//! 1. A failing benchmarks read only affects the benchmarks page (hardcoded rows).
//! 2. Page order, footers, and the insight cap hold.
//! 3. A missing credential still produces the full document with fallback content.

use pulse_core::records::*;
use pulse_core::{
    compile_report, seed, GenerationResult, Insight, InsightGenerator, InsightService,
    InsightSource, LlmConfig, MetricsSource, MetricsStore, ReportContext, StoreError,
    SummaryResult, FALLBACK_SUMMARY,
};
use serde_json::Value;

/// Delegates to the real store except for benchmarks, which always fail.
struct BrokenBenchmarks(MetricsStore);

impl MetricsSource for BrokenBenchmarks {
    fn sales_data(&self, c: &str, p: Option<&str>) -> Result<Option<SalesData>, StoreError> {
        self.0.sales_data(c, p)
    }
    fn funding_health(&self, c: &str, p: Option<&str>) -> Result<Option<FundingHealth>, StoreError> {
        self.0.funding_health(c, p)
    }
    fn fico_distribution(&self, c: &str, p: Option<&str>) -> Result<Vec<FicoDistribution>, StoreError> {
        self.0.fico_distribution(c, p)
    }
    fn loan_amounts(&self, c: &str, p: Option<&str>) -> Result<Option<LoanAmounts>, StoreError> {
        self.0.loan_amounts(c, p)
    }
    fn benchmarks(&self, _c: &str, _p: Option<&str>) -> Result<Vec<Benchmark>, StoreError> {
        Err(StoreError::NotFound("benchmarks tree unavailable".to_string()))
    }
    fn pipeline_stages(&self, c: &str, p: Option<&str>) -> Result<Vec<PipelineStage>, StoreError> {
        self.0.pipeline_stages(c, p)
    }
    fn expiring_loans(&self, c: &str, p: Option<&str>) -> Result<Option<ExpiringLoans>, StoreError> {
        self.0.expiring_loans(c, p)
    }
    fn action_items(&self, c: &str, p: Option<&str>) -> Result<Vec<ActionItem>, StoreError> {
        self.0.action_items(c, p)
    }
    fn customer_feedback(&self, c: &str, p: Option<&str>) -> Result<Option<CustomerFeedback>, StoreError> {
        self.0.customer_feedback(c, p)
    }
    fn feedback_by_touchpoint(&self, c: &str, p: Option<&str>) -> Result<Vec<TouchpointFeedback>, StoreError> {
        self.0.feedback_by_touchpoint(c, p)
    }
}

/// Five insights per section, so the page cap is visible.
struct Chatty;

#[async_trait::async_trait]
impl InsightService for Chatty {
    async fn generate(&self, section: &str, _metrics: &Value) -> GenerationResult {
        GenerationResult::ai(
            (1..=5)
                .map(|i| Insight::new("x", &format!("{section} insight {i}"), "body"))
                .collect(),
        )
    }

    async fn summary(&self, _metrics: &Value) -> SummaryResult {
        SummaryResult {
            summary: "First paragraph.\n\nSecond paragraph.".to_string(),
            source: InsightSource::Ai,
        }
    }
}

fn seeded() -> (MetricsStore, ReportContext, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = MetricsStore::open_path(dir.path().join("metrics")).unwrap();
    let contractor = seed(&store).unwrap().contractor;
    let user = store.contractor_user(&contractor.id).unwrap();
    let ctx = ReportContext::new(&contractor, user.as_ref(), Some("2024"));
    (store, ctx, dir)
}

#[tokio::test]
async fn failed_benchmarks_read_uses_hardcoded_rows() {
    let (store, ctx, _dir) = seeded();
    let source = BrokenBenchmarks(store);
    let generator = InsightGenerator::new(None, &LlmConfig::default());

    let report = compile_report(&source, &generator, &ctx).await;
    assert_eq!(report.page_count(), 7);
    assert_eq!(report.degraded, vec!["benchmarks"]);

    let benchmarks = &report.pages[4];
    assert!(benchmarks.contains("Performance Benchmarks"));
    assert!(benchmarks.contains("Referral Conv."));
    assert!(benchmarks.contains("Target Attainment"));
    assert!(!benchmarks.contains("NPS Score"));

    // other pages still use stored data
    assert!(report.pages[2].contains("$2,475,700"));
    assert!(report.pages[3].contains("Good Standing"));
    assert!(report.pages[5].contains("Docs Sent"));
    assert!(report.pages[6].contains("Application & Sales"));
}

#[tokio::test]
async fn pages_are_ordered_and_footed() {
    let (store, ctx, _dir) = seeded();
    let report = compile_report(&store, &Chatty, &ctx).await;

    let titles = [
        "Executive Summary",
        "Sales Performance",
        "Funding Health",
        "Performance Benchmarks",
        "Project Health",
        "Customer Satisfaction",
    ];
    for (i, title) in titles.iter().enumerate() {
        assert!(report.pages[i + 1].starts_with(title), "page {}: {}", i + 1, title);
        assert!(report.pages[i + 1].contains(&format!("Page {} of 6", i + 1)));
    }
    assert!(report.pages[0].contains("Executive Performance Report"));
    assert!(report.pages[0].contains("Prepared for John | Sales Manager"));
    assert!(!report.pages[0].contains("Page "));
    assert!(report.pages[1].contains("Second paragraph."));

    assert!(report.pages[2].contains("sales insight 3"));
    assert!(!report.pages[2].contains("sales insight 4"));
    assert!(report.fallback_sections.is_empty());
    assert_eq!(report.render().matches('\x0c').count(), 6);
}

#[tokio::test]
async fn no_credential_still_produces_full_report() {
    let (store, ctx, _dir) = seeded();
    let generator = InsightGenerator::new(None, &LlmConfig::default());
    let report = compile_report(&store, &generator, &ctx).await;

    assert_eq!(report.page_count(), 7);
    assert_eq!(report.fallback_sections.len(), 5);
    assert_eq!(report.summary_source, InsightSource::Fallback);
    let first_para = FALLBACK_SUMMARY.split("\n\n").next().unwrap();
    assert!(report.pages[1].contains(first_para.trim()));
    assert!(report.pages[3].contains("Pull-Through Gap"));
}
