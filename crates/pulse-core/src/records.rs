//! Typed rows of the metrics store, one struct per table.
//!
//! Every row is scoped to a contractor through its key prefix; `contractor_id` is also
//! kept in the value so rows read back on their own.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contractor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    pub greeting_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub contractor_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesData {
    pub contractor_id: String,
    pub period: String,
    pub revenue: f64,
    pub target: f64,
    pub projects: u32,
    pub avg_sale: f64,
    pub conversion_rate: f64,
    pub referral_conversion: f64,
    pub repeat_customer_rate: f64,
    pub upsell_rate: f64,
    pub avg_sales_cycle: f64,
    pub cancellations: u32,
    pub avg_install_length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueMonthly {
    pub contractor_id: String,
    pub year: i32,
    pub month: u32,
    pub actual_revenue: f64,
    #[serde(default)]
    pub forecast_revenue: Option<f64>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentPerf {
    pub contractor_id: String,
    pub department: String,
    pub revenue: f64,
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRep {
    pub contractor_id: String,
    pub department: String,
    pub rep_name: String,
    pub amount: f64,
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMix {
    pub contractor_id: String,
    pub category: String,
    pub count: u32,
    pub period: String,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingHealth {
    pub contractor_id: String,
    pub period: String,
    pub approval_rate: f64,
    pub sales_pull_through: f64,
    pub total_delinquent: f64,
    pub delinquency_rate: f64,
    pub payment_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FicoDistribution {
    pub contractor_id: String,
    pub fico_range: String,
    pub approval_probability: f64,
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanAmounts {
    pub contractor_id: String,
    pub period: String,
    pub avg_loan: f64,
    pub utilization_rate: f64,
    pub total_funded: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub contractor_id: String,
    pub period: String,
    pub stage: String,
    pub count: u32,
    pub avg_days: f64,
    pub similar_contractor_avg_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiringLoans {
    pub contractor_id: String,
    pub period: String,
    pub expiring_pct: f64,
    pub expired_value: f64,
    pub active_inventory_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub contractor_id: String,
    pub stage: String,
    pub action_text: String,
    pub project_count: u32,
    pub risk_level: String,
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub contractor_id: String,
    pub metric_name: String,
    pub contractor_value: f64,
    pub peer_value: f64,
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerFeedback {
    pub contractor_id: String,
    pub period: String,
    pub would_recommend_pct: f64,
    pub neutral_pct: f64,
    pub would_not_recommend_pct: f64,
    pub open_issues: u32,
    pub defective_projects: u32,
    pub defective_rate: f64,
    pub escalations: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchpointFeedback {
    pub contractor_id: String,
    pub period: String,
    pub touchpoint: String,
    pub recommend_pct: f64,
    pub neutral_pct: f64,
    pub not_recommend_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInsight {
    pub contractor_id: String,
    pub period: String,
    pub category: String,
    pub description: String,
}

/// Persisted insight. Appended after a successful generation; never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredInsight {
    pub contractor_id: String,
    pub section: String,
    pub insight_type: String,
    pub title: String,
    pub content: String,
    /// Unix milliseconds (UTC).
    pub generated_at: i64,
}
