//! Report-ready metrics with per-field fallbacks.
//!
//! Every dataset is read independently. A failed or empty read swaps in the hardcoded
//! value for that field only and records the field in [`ReportData::degraded`]; the rest
//! of the data is unaffected.

use crate::store::{MetricsSource, StoreError};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesMetrics {
    pub revenue: f64,
    pub projects: u32,
    pub avg_sale: f64,
    pub conversion_rate: f64,
    pub referral_conversion: f64,
    pub repeat_rate: f64,
    pub upsell_rate: f64,
    pub avg_sales_cycle: f64,
    pub cancellations: u32,
    /// Revenue over target, percent with one decimal.
    pub target_attainment: String,
}

impl Default for SalesMetrics {
    fn default() -> Self {
        Self {
            revenue: 2_475_700.0,
            projects: 140,
            avg_sale: 17_683.0,
            conversion_rate: 22.0,
            referral_conversion: 38.9,
            repeat_rate: 42.0,
            upsell_rate: 28.0,
            avg_sales_cycle: 34.0,
            cancellations: 12,
            target_attainment: "95.2".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingMetrics {
    pub approval_rate: f64,
    pub pull_through: f64,
    pub delinquency_rate: f64,
    pub payment_status: String,
    pub avg_loan: f64,
    pub utilization_rate: f64,
    pub total_funded: f64,
}

impl Default for FundingMetrics {
    fn default() -> Self {
        Self {
            approval_rate: 59.5,
            pull_through: 40.2,
            delinquency_rate: 3.2,
            payment_status: "Current".to_string(),
            avg_loan: 10_812.0,
            utilization_rate: 36.0,
            total_funded: 1_513_680.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FicoRow {
    pub fico_range: String,
    pub approval_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkRow {
    pub metric_name: String,
    pub contractor_value: f64,
    pub peer_value: f64,
}

impl BenchmarkRow {
    pub fn difference(&self) -> f64 {
        self.contractor_value - self.peer_value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRow {
    pub stage: String,
    pub count: u32,
    pub avg_days: f64,
    pub peer_avg_days: f64,
}

impl PipelineRow {
    pub fn difference(&self) -> f64 {
        self.avg_days - self.peer_avg_days
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRow {
    pub stage: String,
    pub action_text: String,
    pub project_count: u32,
    pub risk_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetrics {
    pub pipeline_stages: Vec<PipelineRow>,
    pub expiring_pct: f64,
    pub expired_value: f64,
    pub action_items: Vec<ActionRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SatisfactionMetrics {
    pub would_recommend_pct: f64,
    pub neutral_pct: f64,
    pub would_not_recommend_pct: f64,
    pub open_issues: u32,
    pub defective_projects: u32,
    pub defective_rate: f64,
    pub escalations: u32,
}

impl Default for SatisfactionMetrics {
    fn default() -> Self {
        Self {
            would_recommend_pct: 58.0,
            neutral_pct: 31.0,
            would_not_recommend_pct: 11.0,
            open_issues: 8,
            defective_projects: 5,
            defective_rate: 3.6,
            escalations: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchpointRow {
    pub touchpoint: String,
    pub recommend_pct: f64,
    pub neutral_pct: f64,
    pub not_recommend_pct: f64,
}

const EXPIRING_PCT_FALLBACK: f64 = 39.0;
const EXPIRED_VALUE_FALLBACK: f64 = 245_000.0;

pub fn fallback_fico() -> Vec<FicoRow> {
    [
        ("800+", 95.0),
        ("740-799", 85.0),
        ("700-739", 72.0),
        ("660-699", 55.0),
        ("620-659", 38.0),
        ("580-619", 22.0),
    ]
    .into_iter()
    .map(|(r, p)| FicoRow {
        fico_range: r.to_string(),
        approval_probability: p,
    })
    .collect()
}

pub fn fallback_benchmarks() -> Vec<BenchmarkRow> {
    [
        ("Conversion Rate", 22.0, 18.0),
        ("Avg Sale", 17_683.0, 15_200.0),
        ("Referral Conv.", 38.9, 25.0),
        ("Repeat Customers", 42.0, 35.0),
        ("Upsell Rate", 28.0, 20.0),
        ("Avg Sales Cycle", 34.0, 42.0),
        ("Target Attainment", 95.2, 88.0),
    ]
    .into_iter()
    .map(|(m, c, p)| BenchmarkRow {
        metric_name: m.to_string(),
        contractor_value: c,
        peer_value: p,
    })
    .collect()
}

pub fn fallback_pipeline() -> Vec<PipelineRow> {
    [
        ("Submitted", 218, 1.2, 1.5),
        ("Approved", 150, 2.8, 3.2),
        ("Signed", 128, 4.2, 3.8),
        ("NTP", 110, 12.0, 8.0),
        ("Install Complete", 95, 18.5, 15.0),
        ("Funded", 88, 3.5, 4.0),
    ]
    .into_iter()
    .map(|(s, c, d, p)| PipelineRow {
        stage: s.to_string(),
        count: c,
        avg_days: d,
        peer_avg_days: p,
    })
    .collect()
}

pub fn fallback_touchpoints() -> Vec<TouchpointRow> {
    [
        ("Sales Process", 65.0, 25.0, 10.0),
        ("Funding", 55.0, 38.0, 7.0),
        ("Installation", 48.0, 35.0, 17.0),
        ("Post-Funding", 55.0, 32.0, 13.0),
    ]
    .into_iter()
    .map(|(t, r, n, x)| TouchpointRow {
        touchpoint: t.to_string(),
        recommend_pct: r,
        neutral_pct: n,
        not_recommend_pct: x,
    })
    .collect()
}

/// Everything the report and the section snapshots are built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub sales: SalesMetrics,
    pub funding: FundingMetrics,
    pub fico_distribution: Vec<FicoRow>,
    pub benchmarks: Vec<BenchmarkRow>,
    pub projects: ProjectMetrics,
    pub satisfaction: SatisfactionMetrics,
    pub touchpoints: Vec<TouchpointRow>,
    /// Fields that were replaced by their hardcoded fallback.
    #[serde(skip)]
    pub degraded: Vec<&'static str>,
}

impl Default for ReportData {
    fn default() -> Self {
        Self {
            sales: SalesMetrics::default(),
            funding: FundingMetrics::default(),
            fico_distribution: fallback_fico(),
            benchmarks: fallback_benchmarks(),
            projects: ProjectMetrics {
                pipeline_stages: fallback_pipeline(),
                expiring_pct: EXPIRING_PCT_FALLBACK,
                expired_value: EXPIRED_VALUE_FALLBACK,
                action_items: Vec::new(),
            },
            satisfaction: SatisfactionMetrics::default(),
            touchpoints: fallback_touchpoints(),
            degraded: Vec::new(),
        }
    }
}

struct Reads<'a> {
    degraded: &'a mut Vec<&'static str>,
}

impl Reads<'_> {
    fn one<T>(&mut self, field: &'static str, res: Result<Option<T>, StoreError>) -> Option<T> {
        match res {
            Ok(Some(v)) => Some(v),
            Ok(None) => {
                tracing::debug!(target: "pulse::report", field, "no rows, using fallback");
                self.degraded.push(field);
                None
            }
            Err(e) => {
                tracing::warn!(target: "pulse::report", field, error = %e, "metrics read failed, using fallback");
                self.degraded.push(field);
                None
            }
        }
    }

    fn rows<T>(&mut self, field: &'static str, res: Result<Vec<T>, StoreError>) -> Option<Vec<T>> {
        self.one(field, res.map(|v| if v.is_empty() { None } else { Some(v) }))
    }
}

impl ReportData {
    /// Read every dataset for `contractor_id`. Never fails; see the module docs.
    pub fn collect(source: &dyn MetricsSource, contractor_id: &str, period: Option<&str>) -> Self {
        let mut data = ReportData::default();
        let mut degraded = Vec::new();
        let mut r = Reads {
            degraded: &mut degraded,
        };

        if let Some(sd) = r.one("sales", source.sales_data(contractor_id, period)) {
            let attainment = if sd.target > 0.0 {
                format!("{:.1}", sd.revenue / sd.target * 100.0)
            } else {
                data.sales.target_attainment.clone()
            };
            data.sales = SalesMetrics {
                revenue: sd.revenue,
                projects: sd.projects,
                avg_sale: sd.avg_sale,
                conversion_rate: sd.conversion_rate,
                referral_conversion: sd.referral_conversion,
                repeat_rate: sd.repeat_customer_rate,
                upsell_rate: sd.upsell_rate,
                avg_sales_cycle: sd.avg_sales_cycle,
                cancellations: sd.cancellations,
                target_attainment: attainment,
            };
        }

        if let Some(fh) = r.one("funding_health", source.funding_health(contractor_id, period)) {
            data.funding.approval_rate = fh.approval_rate;
            data.funding.pull_through = fh.sales_pull_through;
            data.funding.delinquency_rate = fh.delinquency_rate;
            data.funding.payment_status = fh.payment_status;
        }
        if let Some(la) = r.one("loan_amounts", source.loan_amounts(contractor_id, period)) {
            data.funding.avg_loan = la.avg_loan;
            data.funding.utilization_rate = la.utilization_rate;
            data.funding.total_funded = la.total_funded;
        }

        if let Some(rows) = r.rows("fico_distribution", source.fico_distribution(contractor_id, period)) {
            data.fico_distribution = rows
                .into_iter()
                .map(|f| FicoRow {
                    fico_range: f.fico_range,
                    approval_probability: f.approval_probability,
                })
                .collect();
        }

        if let Some(rows) = r.rows("benchmarks", source.benchmarks(contractor_id, period)) {
            data.benchmarks = rows
                .into_iter()
                .map(|b| BenchmarkRow {
                    metric_name: b.metric_name,
                    contractor_value: b.contractor_value,
                    peer_value: b.peer_value,
                })
                .collect();
        }

        if let Some(rows) = r.rows("pipeline_stages", source.pipeline_stages(contractor_id, period)) {
            data.projects.pipeline_stages = rows
                .into_iter()
                .map(|p| PipelineRow {
                    stage: p.stage,
                    count: p.count,
                    avg_days: p.avg_days,
                    peer_avg_days: p.similar_contractor_avg_days,
                })
                .collect();
        }
        if let Some(el) = r.one("expiring_loans", source.expiring_loans(contractor_id, period)) {
            data.projects.expiring_pct = el.expiring_pct;
            data.projects.expired_value = el.expired_value;
        }
        if let Some(rows) = r.rows("action_items", source.action_items(contractor_id, period)) {
            data.projects.action_items = rows
                .into_iter()
                .map(|a| ActionRow {
                    stage: a.stage,
                    action_text: a.action_text,
                    project_count: a.project_count,
                    risk_level: a.risk_level,
                })
                .collect();
        }

        if let Some(cf) = r.one("customer_feedback", source.customer_feedback(contractor_id, period)) {
            data.satisfaction = SatisfactionMetrics {
                would_recommend_pct: cf.would_recommend_pct,
                neutral_pct: cf.neutral_pct,
                would_not_recommend_pct: cf.would_not_recommend_pct,
                open_issues: cf.open_issues,
                defective_projects: cf.defective_projects,
                defective_rate: cf.defective_rate,
                escalations: cf.escalations,
            };
        }
        if let Some(rows) = r.rows("touchpoints", source.feedback_by_touchpoint(contractor_id, period)) {
            data.touchpoints = rows
                .into_iter()
                .map(|t| TouchpointRow {
                    touchpoint: t.touchpoint,
                    recommend_pct: t.recommend_pct,
                    neutral_pct: t.neutral_pct,
                    not_recommend_pct: t.not_recommend_pct,
                })
                .collect();
        }

        data.degraded = degraded;
        data
    }

    pub fn is_degraded(&self, field: &str) -> bool {
        self.degraded.iter().any(|d| *d == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed;
    use crate::store::MetricsStore;

    #[test]
    fn empty_store_degrades_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetricsStore::open_path(dir.path().join("m")).unwrap();
        let data = ReportData::collect(&store, "nobody", None);
        assert_eq!(data.sales, SalesMetrics::default());
        assert_eq!(data.benchmarks, fallback_benchmarks());
        assert_eq!(data.projects.expiring_pct, 39.0);
        assert!(data.is_degraded("benchmarks"));
        assert!(data.is_degraded("customer_feedback"));
    }

    #[test]
    fn seeded_store_uses_stored_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetricsStore::open_path(dir.path().join("m")).unwrap();
        let cid = seed(&store).unwrap().contractor.id;
        let data = ReportData::collect(&store, &cid, Some("2024"));
        assert!(data.degraded.is_empty(), "degraded: {:?}", data.degraded);
        assert_eq!(data.sales.target_attainment, "95.2");
        assert_eq!(data.funding.payment_status, "Good Standing");
        assert_eq!(data.projects.pipeline_stages.len(), 7);
        assert_eq!(data.projects.action_items.len(), 6);
        assert_eq!(data.touchpoints.len(), 3);
    }
}
