//! Metrics store: sled-backed, one tree per table.
//!
//! Keys are `{contractor_id}/{monotonic id}` so a prefix scan is the per-contractor
//! index and rows come back in insertion order. Period and section filters are applied
//! after the scan. Writes are appends only.

use crate::records::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Year used by `revenue_monthly` when none is given.
pub const DEFAULT_REVENUE_YEAR: i32 = 2024;

/// Tables of the store. Each maps to one sled tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Contractors,
    Users,
    SalesData,
    RevenueMonthly,
    DepartmentPerf,
    TopReps,
    ProductMix,
    FundingHealth,
    FicoDistribution,
    LoanAmounts,
    PipelineStages,
    ExpiringLoans,
    ActionItems,
    Benchmarks,
    CustomerFeedback,
    FeedbackByTouchpoint,
    CustomerInsights,
    AiInsights,
}

impl Table {
    pub fn tree_name(&self) -> &'static str {
        match self {
            Table::Contractors => "contractors",
            Table::Users => "users",
            Table::SalesData => "sales_data",
            Table::RevenueMonthly => "revenue_monthly",
            Table::DepartmentPerf => "department_perf",
            Table::TopReps => "top_reps",
            Table::ProductMix => "product_mix",
            Table::FundingHealth => "funding_health",
            Table::FicoDistribution => "fico_distribution",
            Table::LoanAmounts => "loan_amounts",
            Table::PipelineStages => "pipeline_stages",
            Table::ExpiringLoans => "expiring_loans",
            Table::ActionItems => "action_items",
            Table::Benchmarks => "benchmarks",
            Table::CustomerFeedback => "customer_feedback",
            Table::FeedbackByTouchpoint => "feedback_by_touchpoint",
            Table::CustomerInsights => "customer_insights",
            Table::AiInsights => "ai_insights",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled: {0}")]
    Sled(#[from] sled::Error),
    #[error("record encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Index lookup shape: always one contractor, optionally narrowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub contractor_id: String,
    pub period: Option<String>,
    pub section: Option<String>,
}

impl RecordFilter {
    pub fn contractor(contractor_id: &str) -> Self {
        Self {
            contractor_id: contractor_id.to_string(),
            ..Self::default()
        }
    }

    pub fn with_period(mut self, period: Option<&str>) -> Self {
        self.period = period.map(str::to_string);
        self
    }

    pub fn with_section(mut self, section: &str) -> Self {
        self.section = Some(section.to_string());
        self
    }

    fn matches(&self, value: &Value) -> bool {
        let field_is = |name: &str, want: &Option<String>| match want {
            Some(w) => value.get(name).and_then(Value::as_str) == Some(w.as_str()),
            None => true,
        };
        field_is("period", &self.period) && field_is("section", &self.section)
    }
}

/// Reads the report needs. [`MetricsStore`] implements it; tests substitute failing sources.
pub trait MetricsSource: Send + Sync {
    fn sales_data(&self, contractor_id: &str, period: Option<&str>) -> Result<Option<SalesData>, StoreError>;
    fn funding_health(&self, contractor_id: &str, period: Option<&str>) -> Result<Option<FundingHealth>, StoreError>;
    fn fico_distribution(&self, contractor_id: &str, period: Option<&str>) -> Result<Vec<FicoDistribution>, StoreError>;
    fn loan_amounts(&self, contractor_id: &str, period: Option<&str>) -> Result<Option<LoanAmounts>, StoreError>;
    fn benchmarks(&self, contractor_id: &str, period: Option<&str>) -> Result<Vec<Benchmark>, StoreError>;
    fn pipeline_stages(&self, contractor_id: &str, period: Option<&str>) -> Result<Vec<PipelineStage>, StoreError>;
    fn expiring_loans(&self, contractor_id: &str, period: Option<&str>) -> Result<Option<ExpiringLoans>, StoreError>;
    fn action_items(&self, contractor_id: &str, period: Option<&str>) -> Result<Vec<ActionItem>, StoreError>;
    fn customer_feedback(&self, contractor_id: &str, period: Option<&str>) -> Result<Option<CustomerFeedback>, StoreError>;
    fn feedback_by_touchpoint(&self, contractor_id: &str, period: Option<&str>) -> Result<Vec<TouchpointFeedback>, StoreError>;
}

pub struct MetricsStore {
    db: sled::Db,
}

impl MetricsStore {
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn tree(&self, table: Table) -> Result<sled::Tree, StoreError> {
        Ok(self.db.open_tree(table.tree_name())?)
    }

    /// Append a row under `contractor_id`. Returns the row key.
    pub fn insert<T: Serialize>(
        &self,
        table: Table,
        contractor_id: &str,
        record: &T,
    ) -> Result<String, StoreError> {
        let key = format!("{}/{:020}", contractor_id, self.db.generate_id()?);
        let bytes = serde_json::to_vec(record)?;
        self.tree(table)?.insert(key.as_bytes(), bytes)?;
        Ok(key)
    }

    /// Raw rows for one contractor, filtered by period/section when given.
    pub fn get(&self, table: Table, filter: &RecordFilter) -> Result<Vec<Value>, StoreError> {
        let prefix = format!("{}/", filter.contractor_id);
        let mut out = Vec::new();
        for entry in self.tree(table)?.scan_prefix(prefix.as_bytes()) {
            let (_, v) = entry?;
            let value: Value = serde_json::from_slice(&v)?;
            if filter.matches(&value) {
                out.push(value);
            }
        }
        Ok(out)
    }

    /// Typed [`MetricsStore::get`].
    pub fn get_as<T: DeserializeOwned>(
        &self,
        table: Table,
        filter: &RecordFilter,
    ) -> Result<Vec<T>, StoreError> {
        self.get(table, filter)?
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(StoreError::from))
            .collect()
    }

    fn all<T: DeserializeOwned>(
        &self,
        table: Table,
        contractor_id: &str,
        period: Option<&str>,
    ) -> Result<Vec<T>, StoreError> {
        self.get_as(table, &RecordFilter::contractor(contractor_id).with_period(period))
    }

    /// Single-row tables: the period match, or the first row when no period is given.
    fn one<T: DeserializeOwned>(
        &self,
        table: Table,
        contractor_id: &str,
        period: Option<&str>,
    ) -> Result<Option<T>, StoreError> {
        Ok(self.all(table, contractor_id, period)?.into_iter().next())
    }

    pub fn len(&self, table: Table) -> Result<usize, StoreError> {
        Ok(self.tree(table)?.len())
    }

    // ── contractors ──────────────────────────────────────────────────────────

    /// Contractors are keyed by insertion id only; the contractor id lives in the value.
    pub fn insert_contractor(&self, contractor: &Contractor) -> Result<(), StoreError> {
        let key = format!("{:020}", self.db.generate_id()?);
        self.tree(Table::Contractors)?
            .insert(key.as_bytes(), serde_json::to_vec(contractor)?)?;
        Ok(())
    }

    /// First contractor ever inserted.
    pub fn default_contractor(&self) -> Result<Option<Contractor>, StoreError> {
        match self.tree(Table::Contractors)?.iter().next() {
            Some(entry) => {
                let (_, v) = entry?;
                Ok(Some(serde_json::from_slice(&v)?))
            }
            None => Ok(None),
        }
    }

    pub fn contractor(&self, id: &str) -> Result<Option<Contractor>, StoreError> {
        for entry in self.tree(Table::Contractors)?.iter() {
            let (_, v) = entry?;
            let c: Contractor = serde_json::from_slice(&v)?;
            if c.id == id {
                return Ok(Some(c));
            }
        }
        Ok(None)
    }

    pub fn contractor_user(&self, contractor_id: &str) -> Result<Option<User>, StoreError> {
        self.one(Table::Users, contractor_id, None)
    }

    // ── sales ────────────────────────────────────────────────────────────────

    /// Months of `year` (default 2024), ascending.
    pub fn revenue_monthly(
        &self,
        contractor_id: &str,
        year: Option<i32>,
    ) -> Result<Vec<RevenueMonthly>, StoreError> {
        let year = year.unwrap_or(DEFAULT_REVENUE_YEAR);
        let mut rows: Vec<RevenueMonthly> = self
            .all::<RevenueMonthly>(Table::RevenueMonthly, contractor_id, None)?
            .into_iter()
            .filter(|r| r.year == year)
            .collect();
        rows.sort_by_key(|r| r.month);
        Ok(rows)
    }

    pub fn department_performance(
        &self,
        contractor_id: &str,
        period: Option<&str>,
    ) -> Result<Vec<DepartmentPerf>, StoreError> {
        self.all(Table::DepartmentPerf, contractor_id, period)
    }

    /// Reps by amount, highest first.
    pub fn top_reps(
        &self,
        contractor_id: &str,
        department: Option<&str>,
        period: Option<&str>,
    ) -> Result<Vec<TopRep>, StoreError> {
        let mut rows: Vec<TopRep> = self
            .all::<TopRep>(Table::TopReps, contractor_id, period)?
            .into_iter()
            .filter(|r| department.map_or(true, |d| r.department == d))
            .collect();
        rows.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        Ok(rows)
    }

    pub fn product_mix(
        &self,
        contractor_id: &str,
        period: Option<&str>,
    ) -> Result<Vec<ProductMix>, StoreError> {
        self.all(Table::ProductMix, contractor_id, period)
    }

    pub fn customer_insights(
        &self,
        contractor_id: &str,
        period: Option<&str>,
    ) -> Result<Vec<CustomerInsight>, StoreError> {
        self.all(Table::CustomerInsights, contractor_id, period)
    }

    // ── ai insights ──────────────────────────────────────────────────────────

    pub fn insights(
        &self,
        contractor_id: &str,
        section: &str,
    ) -> Result<Vec<StoredInsight>, StoreError> {
        self.get_as(
            Table::AiInsights,
            &RecordFilter::contractor(contractor_id).with_section(section),
        )
    }

    pub fn append_insight(&self, insight: &StoredInsight) -> Result<String, StoreError> {
        self.insert(Table::AiInsights, &insight.contractor_id, insight)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

impl MetricsSource for MetricsStore {
    fn sales_data(&self, contractor_id: &str, period: Option<&str>) -> Result<Option<SalesData>, StoreError> {
        self.one(Table::SalesData, contractor_id, period)
    }

    fn funding_health(&self, contractor_id: &str, period: Option<&str>) -> Result<Option<FundingHealth>, StoreError> {
        self.one(Table::FundingHealth, contractor_id, period)
    }

    fn fico_distribution(&self, contractor_id: &str, period: Option<&str>) -> Result<Vec<FicoDistribution>, StoreError> {
        self.all(Table::FicoDistribution, contractor_id, period)
    }

    fn loan_amounts(&self, contractor_id: &str, period: Option<&str>) -> Result<Option<LoanAmounts>, StoreError> {
        self.one(Table::LoanAmounts, contractor_id, period)
    }

    fn benchmarks(&self, contractor_id: &str, period: Option<&str>) -> Result<Vec<Benchmark>, StoreError> {
        self.all(Table::Benchmarks, contractor_id, period)
    }

    fn pipeline_stages(&self, contractor_id: &str, period: Option<&str>) -> Result<Vec<PipelineStage>, StoreError> {
        self.all(Table::PipelineStages, contractor_id, period)
    }

    fn expiring_loans(&self, contractor_id: &str, period: Option<&str>) -> Result<Option<ExpiringLoans>, StoreError> {
        self.one(Table::ExpiringLoans, contractor_id, period)
    }

    fn action_items(&self, contractor_id: &str, period: Option<&str>) -> Result<Vec<ActionItem>, StoreError> {
        self.all(Table::ActionItems, contractor_id, period)
    }

    fn customer_feedback(&self, contractor_id: &str, period: Option<&str>) -> Result<Option<CustomerFeedback>, StoreError> {
        self.one(Table::CustomerFeedback, contractor_id, period)
    }

    fn feedback_by_touchpoint(&self, contractor_id: &str, period: Option<&str>) -> Result<Vec<TouchpointFeedback>, StoreError> {
        self.all(Table::FeedbackByTouchpoint, contractor_id, period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bench(contractor_id: &str, name: &str, period: &str) -> Benchmark {
        Benchmark {
            contractor_id: contractor_id.to_string(),
            metric_name: name.to_string(),
            contractor_value: 1.0,
            peer_value: 2.0,
            period: period.to_string(),
        }
    }

    #[test]
    fn period_filter_narrows_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetricsStore::open_path(dir.path().join("m")).unwrap();
        store.insert(Table::Benchmarks, "c1", &bench("c1", "A", "2023")).unwrap();
        store.insert(Table::Benchmarks, "c1", &bench("c1", "B", "2024")).unwrap();
        store.insert(Table::Benchmarks, "c1", &bench("c1", "C", "2024")).unwrap();

        let only_2024 = store.benchmarks("c1", Some("2024")).unwrap();
        assert_eq!(
            only_2024.iter().map(|b| b.metric_name.as_str()).collect::<Vec<_>>(),
            vec!["B", "C"]
        );
        assert_eq!(store.benchmarks("c1", None).unwrap().len(), 3);
    }

    #[test]
    fn rows_are_scoped_to_contractor() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetricsStore::open_path(dir.path().join("m")).unwrap();
        store.insert(Table::Benchmarks, "c1", &bench("c1", "A", "2024")).unwrap();
        store.insert(Table::Benchmarks, "c10", &bench("c10", "B", "2024")).unwrap();
        assert_eq!(store.benchmarks("c1", None).unwrap().len(), 1);
        assert_eq!(store.benchmarks("c10", None).unwrap().len(), 1);
        assert!(store.benchmarks("c2", None).unwrap().is_empty());
    }

    #[test]
    fn appended_insights_are_never_merged() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetricsStore::open_path(dir.path().join("m")).unwrap();
        let row = StoredInsight {
            contractor_id: "c1".into(),
            section: "sales".into(),
            insight_type: "performance".into(),
            title: "T".into(),
            content: "C".into(),
            generated_at: 1,
        };
        store.append_insight(&row).unwrap();
        store.append_insight(&row).unwrap();
        assert_eq!(store.insights("c1", "sales").unwrap().len(), 2);
        assert!(store.insights("c1", "funding").unwrap().is_empty());
    }
}
