//! Demo data: one contractor (EverGreen Climate, 2024) across every table.
//!
//! `seed` is idempotent: when any contractor exists it returns that one untouched.

use crate::records::*;
use crate::store::{MetricsStore, StoreError, Table};

pub const SEED_PERIOD: &str = "2024";
pub const SEED_YEAR: i32 = 2024;

/// (month, actual, forecast)
const MONTHLY_TOTALS: [(u32, f64, Option<f64>); 12] = [
    (1, 165_000.0, None),
    (2, 178_000.0, None),
    (3, 195_000.0, None),
    (4, 210_000.0, None),
    (5, 225_000.0, None),
    (6, 238_000.0, None),
    (7, 215_000.0, None),
    (8, 198_000.0, None),
    (9, 220_000.0, None),
    (10, 245_000.0, Some(240_000.0)),
    (11, 230_000.0, Some(235_000.0)),
    (12, 156_700.0, Some(220_000.0)),
];

const DEPT_REVENUE_SHARES: [(&str, f64); 6] = [
    ("West Coast", 0.246),
    ("Northeast", 0.199),
    ("Southeast", 0.180),
    ("Midwest", 0.147),
    ("Southwest", 0.135),
    ("Pacific NW", 0.092),
];

const PRODUCT_CATEGORIES: [&str; 5] = ["Home Improvement", "Roofing", "Home Remodel", "Solar Panel", "HVAC"];

/// Counts per department, in `PRODUCT_CATEGORIES` order.
const PRODUCT_MIX_BY_DEPT: [(&str, [u32; 5]); 6] = [
    ("West Coast", [14, 10, 9, 8, 5]),
    ("Northeast", [12, 11, 8, 5, 4]),
    ("Southeast", [10, 9, 7, 6, 4]),
    ("Midwest", [8, 8, 6, 4, 3]),
    ("Southwest", [7, 6, 5, 3, 2]),
    ("Pacific NW", [4, 4, 2, 2, 1]),
];

const DEPARTMENTS: [(&str, f64); 6] = [
    ("Northeast", 420_000.0),
    ("Southeast", 380_000.0),
    ("Midwest", 310_000.0),
    ("West Coast", 520_000.0),
    ("Southwest", 285_000.0),
    ("Pacific NW", 195_000.0),
];

const TOP_REPS: [(&str, &str, f64); 12] = [
    ("Northeast", "Sarah Chen", 185_000.0),
    ("Northeast", "Mike Torres", 142_000.0),
    ("Southeast", "David Kim", 168_000.0),
    ("Southeast", "Lisa Wang", 125_000.0),
    ("Midwest", "James Miller", 134_000.0),
    ("Midwest", "Anna Scott", 98_000.0),
    ("West Coast", "Ryan Park", 210_000.0),
    ("West Coast", "Emily Davis", 178_000.0),
    ("Southwest", "Carlos Ruiz", 145_000.0),
    ("Southwest", "Amy Johnson", 88_000.0),
    ("Pacific NW", "Tom Wilson", 112_000.0),
    ("Pacific NW", "Jen Martinez", 83_000.0),
];

const FICO_RANGES: [(&str, f64); 6] = [
    ("580-619", 15.0),
    ("620-659", 35.0),
    ("660-699", 55.0),
    ("700-739", 72.0),
    ("740-779", 85.0),
    ("780+", 92.0),
];

/// (stage, count, avg_days, similar_contractor_avg_days)
const PIPELINE: [(&str, u32, f64, f64); 7] = [
    ("Submitted", 141, 2.1, 2.5),
    ("Approved", 97, 3.4, 4.2),
    ("Docs Sent", 84, 1.8, 2.0),
    ("Contract Signed", 72, 4.5, 3.8),
    ("NTP", 63, 6.2, 5.0),
    ("Install Complete", 58, 18.5, 15.0),
    ("Funded", 51, 3.2, 3.5),
];

const ACTIONS: [(&str, &str, u32, &str); 6] = [
    ("Approved", "Send loan documents to approved applicants", 13, "high"),
    ("Docs Sent", "Follow up on unsigned documents", 12, "medium"),
    ("Contract Signed", "Submit for NTP approval", 9, "low"),
    ("NTP", "Schedule installation appointments", 12, "medium"),
    ("Install Complete", "Submit funding request for completed installs", 7, "high"),
    ("Expiring", "Contact customers with expiring loan approvals", 15, "high"),
];

const BENCHMARKS: [(&str, f64, f64); 7] = [
    ("Conversion Rate", 22.0, 18.0),
    ("Avg Sale", 17_683.0, 15_200.0),
    ("Referral Rate", 38.9, 25.0),
    ("Customer Retention", 42.0, 35.0),
    ("Avg Sales Cycle", 34.0, 42.0),
    ("Upsell Rate", 28.0, 20.0),
    ("NPS Score", 58.0, 52.0),
];

const TOUCHPOINTS: [(&str, f64, f64, f64); 3] = [
    ("Application & Sales", 72.0, 20.0, 8.0),
    ("Installation", 48.0, 35.0, 17.0),
    ("Post-Funding", 55.0, 38.0, 7.0),
];

const CUSTOMER_INSIGHTS: [(&str, &str); 3] = [
    ("Site Cleanup", "Multiple reports of debris left after installation. Implement mandatory cleanup checklist."),
    ("Install Quality", "Panel alignment issues reported in 12% of installations. Schedule additional QC inspections."),
    ("Follow-ups", "Post-installation follow-up calls delayed by average 5 days. Automate scheduling within 48 hours."),
];

/// Pre-generated insights: (section, insight_type, title, content).
const AI_INSIGHTS: [(&str, &str, &str, &str); 15] = [
    ("sales", "Sales Performance Insight", "Strong Growth Trajectory", "Your 3.9% revenue growth and $206K monthly average demonstrate consistent market penetration. Focus on maintaining the Q4 momentum by targeting the home improvement segment which shows highest conversion rates."),
    ("sales", "Growth Insight", "Monthly Revenue Acceleration", "October peak of $245K suggests strong seasonal demand. Consider pre-positioning inventory and staffing for Q4 2025 to capture similar or greater revenue."),
    ("sales", "Top Recommendation", "Expand Referral Program", "With 38.9% referral conversion, well above the 25% industry average, invest in formalizing your referral incentive program to drive even more high-quality leads."),
    ("sales", "Market Opportunity", "Home Remodel Expansion", "Home remodel projects show the highest average ticket size. Consider targeted marketing campaigns to grow this segment from 37 to 50+ projects next quarter."),
    ("funding", "Approval Alert", "Pull-Through Gap", "Your 59.5% approval rate is solid, but only 40.2% pull-through means you're losing nearly 20% of approved applicants. Streamline your post-approval process to capture more funded deals."),
    ("funding", "Payment Performance", "Healthy Portfolio", "3.2% delinquency rate is well within industry norms. Continue monitoring the 580-659 FICO segment which carries higher risk."),
    ("benchmarks", "Sales Excellence", "Outperforming Peers", "Your conversion rate of 22% exceeds the peer average of 18%. Your shorter sales cycle (34 vs 42 days) gives you a competitive edge in closing deals faster."),
    ("benchmarks", "Customer Loyalty", "Strong Retention", "42% repeat customer rate (vs 35% peers) and 38.9% referral rate show strong customer relationships. This organic growth engine reduces your customer acquisition costs."),
    ("benchmarks", "Growth Potential", "Upsell Opportunity", "28% upsell rate significantly exceeds the 20% peer average. Train the full sales team on the upsell strategies your top performers use."),
    ("projects", "Bottleneck Detection", "Installation Bottleneck", "Average 18.5 days at Install Complete stage (vs 15 days for similar contractors) suggests installation scheduling or capacity constraints."),
    ("projects", "Signature Lag", "Contract Signing Delay", "4.5 days to sign contracts (vs 3.8 peer avg) indicates friction in the signing process. Consider e-signature solutions or simplified contracts."),
    ("projects", "Approval Strength", "Strong Top-of-Funnel", "68.8% submission-to-approval rate exceeds industry benchmarks. Your pre-qualification process is effective at filtering quality applications."),
    ("satisfaction", "Installation Experience", "Installation Improvement Needed", "Installation touchpoint has lowest recommendation rate (48%). Focus on cleanup procedures and panel alignment quality to boost satisfaction."),
    ("satisfaction", "Post-Funding Success", "Positive Post-Funding Experience", "55% recommendation in post-funding with only 7% negative shows strong ongoing customer relationships after project completion."),
    ("satisfaction", "Overall Trend", "Above Average Sentiment", "58% recommendation rate with only 11% detractors puts you in a solid position. Target the 31% neutral segment with proactive outreach to convert them to promoters."),
];

/// Outcome of [`seed`].
#[derive(Debug, Clone, PartialEq)]
pub struct SeedOutcome {
    pub contractor: Contractor,
    /// False when data already existed and nothing was written.
    pub created: bool,
}

pub fn seed(store: &MetricsStore) -> Result<SeedOutcome, StoreError> {
    if let Some(existing) = store.default_contractor()? {
        tracing::info!(target: "pulse::seed", contractor = %existing.id, "Data already seeded");
        return Ok(SeedOutcome {
            contractor: existing,
            created: false,
        });
    }

    let contractor = Contractor {
        id: uuid::Uuid::new_v4().to_string(),
        name: "EverGreen Climate".to_string(),
        logo: None,
        greeting_name: "John".to_string(),
    };
    store.insert_contractor(&contractor)?;
    let cid = contractor.id.as_str();
    let period = || SEED_PERIOD.to_string();

    store.insert(
        Table::Users,
        cid,
        &User {
            contractor_id: cid.to_string(),
            name: "John".to_string(),
            email: "john@evergreenclimate.com".to_string(),
            role: "Sales Manager".to_string(),
        },
    )?;

    store.insert(
        Table::SalesData,
        cid,
        &SalesData {
            contractor_id: cid.to_string(),
            period: period(),
            revenue: 2_475_700.0,
            target: 2_600_000.0,
            projects: 140,
            avg_sale: 17_683.0,
            conversion_rate: 22.0,
            referral_conversion: 38.9,
            repeat_customer_rate: 42.0,
            upsell_rate: 28.0,
            avg_sales_cycle: 34.0,
            cancellations: 12,
            avg_install_length: 4.2,
        },
    )?;

    for (month, actual, forecast) in MONTHLY_TOTALS {
        for (dept, share) in DEPT_REVENUE_SHARES {
            store.insert(
                Table::RevenueMonthly,
                cid,
                &RevenueMonthly {
                    contractor_id: cid.to_string(),
                    year: SEED_YEAR,
                    month,
                    actual_revenue: (actual * share).round(),
                    forecast_revenue: forecast.map(|f| (f * share).round()),
                    department: Some(dept.to_string()),
                },
            )?;
        }
    }

    for (department, revenue) in DEPARTMENTS {
        store.insert(
            Table::DepartmentPerf,
            cid,
            &DepartmentPerf {
                contractor_id: cid.to_string(),
                department: department.to_string(),
                revenue,
                period: period(),
            },
        )?;
    }

    for (department, rep_name, amount) in TOP_REPS {
        store.insert(
            Table::TopReps,
            cid,
            &TopRep {
                contractor_id: cid.to_string(),
                department: department.to_string(),
                rep_name: rep_name.to_string(),
                amount,
                period: period(),
            },
        )?;
    }

    for (department, counts) in PRODUCT_MIX_BY_DEPT {
        for (category, count) in PRODUCT_CATEGORIES.iter().zip(counts) {
            store.insert(
                Table::ProductMix,
                cid,
                &ProductMix {
                    contractor_id: cid.to_string(),
                    category: category.to_string(),
                    count,
                    period: period(),
                    department: Some(department.to_string()),
                },
            )?;
        }
    }

    store.insert(
        Table::FundingHealth,
        cid,
        &FundingHealth {
            contractor_id: cid.to_string(),
            period: period(),
            approval_rate: 59.5,
            sales_pull_through: 40.2,
            total_delinquent: 125_000.0,
            delinquency_rate: 3.2,
            payment_status: "Good Standing".to_string(),
        },
    )?;

    for (fico_range, approval_probability) in FICO_RANGES {
        store.insert(
            Table::FicoDistribution,
            cid,
            &FicoDistribution {
                contractor_id: cid.to_string(),
                fico_range: fico_range.to_string(),
                approval_probability,
                period: period(),
            },
        )?;
    }

    store.insert(
        Table::LoanAmounts,
        cid,
        &LoanAmounts {
            contractor_id: cid.to_string(),
            period: period(),
            avg_loan: 28_500.0,
            utilization_rate: 78.0,
            total_funded: 3_990_000.0,
        },
    )?;

    for (stage, count, avg_days, similar) in PIPELINE {
        store.insert(
            Table::PipelineStages,
            cid,
            &PipelineStage {
                contractor_id: cid.to_string(),
                period: period(),
                stage: stage.to_string(),
                count,
                avg_days,
                similar_contractor_avg_days: similar,
            },
        )?;
    }

    store.insert(
        Table::ExpiringLoans,
        cid,
        &ExpiringLoans {
            contractor_id: cid.to_string(),
            period: period(),
            expiring_pct: 8.5,
            expired_value: 340_000.0,
            active_inventory_days: 45.0,
        },
    )?;

    for (stage, action_text, project_count, risk_level) in ACTIONS {
        store.insert(
            Table::ActionItems,
            cid,
            &ActionItem {
                contractor_id: cid.to_string(),
                stage: stage.to_string(),
                action_text: action_text.to_string(),
                project_count,
                risk_level: risk_level.to_string(),
                period: period(),
            },
        )?;
    }

    for (metric_name, contractor_value, peer_value) in BENCHMARKS {
        store.insert(
            Table::Benchmarks,
            cid,
            &Benchmark {
                contractor_id: cid.to_string(),
                metric_name: metric_name.to_string(),
                contractor_value,
                peer_value,
                period: period(),
            },
        )?;
    }

    store.insert(
        Table::CustomerFeedback,
        cid,
        &CustomerFeedback {
            contractor_id: cid.to_string(),
            period: period(),
            would_recommend_pct: 58.0,
            neutral_pct: 31.0,
            would_not_recommend_pct: 11.0,
            open_issues: 23,
            defective_projects: 8,
            defective_rate: 5.7,
            escalations: 4,
        },
    )?;

    for (touchpoint, recommend, neutral, not_recommend) in TOUCHPOINTS {
        store.insert(
            Table::FeedbackByTouchpoint,
            cid,
            &TouchpointFeedback {
                contractor_id: cid.to_string(),
                period: period(),
                touchpoint: touchpoint.to_string(),
                recommend_pct: recommend,
                neutral_pct: neutral,
                not_recommend_pct: not_recommend,
            },
        )?;
    }

    for (category, description) in CUSTOMER_INSIGHTS {
        store.insert(
            Table::CustomerInsights,
            cid,
            &CustomerInsight {
                contractor_id: cid.to_string(),
                period: period(),
                category: category.to_string(),
                description: description.to_string(),
            },
        )?;
    }

    let now = chrono::Utc::now().timestamp_millis();
    for (section, insight_type, title, content) in AI_INSIGHTS {
        store.append_insight(&StoredInsight {
            contractor_id: cid.to_string(),
            section: section.to_string(),
            insight_type: insight_type.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            generated_at: now,
        })?;
    }

    store.flush()?;
    tracing::info!(target: "pulse::seed", contractor = %cid, "Seed complete");
    Ok(SeedOutcome {
        contractor,
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MetricsSource;

    #[test]
    fn seed_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetricsStore::open_path(dir.path().join("m")).unwrap();
        let first = seed(&store).unwrap();
        assert!(first.created);
        let second = seed(&store).unwrap();
        assert!(!second.created);
        assert_eq!(first.contractor, second.contractor);
        assert_eq!(store.len(Table::Contractors).unwrap(), 1);
        assert_eq!(store.len(Table::RevenueMonthly).unwrap(), 72);
        assert_eq!(store.len(Table::ProductMix).unwrap(), 30);
    }

    #[test]
    fn seeded_readers_return_demo_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetricsStore::open_path(dir.path().join("m")).unwrap();
        let cid = seed(&store).unwrap().contractor.id;

        let sales = store.sales_data(&cid, Some("2024")).unwrap().unwrap();
        assert_eq!(sales.revenue, 2_475_700.0);
        assert!(store.sales_data(&cid, Some("2023")).unwrap().is_none());

        let months = store.revenue_monthly(&cid, None).unwrap();
        assert_eq!(months.len(), 72);
        assert!(months.windows(2).all(|w| w[0].month <= w[1].month));
        assert!(store.revenue_monthly(&cid, Some(2023)).unwrap().is_empty());

        let reps = store.top_reps(&cid, Some("Northeast"), None).unwrap();
        assert_eq!(reps[0].rep_name, "Sarah Chen");
        let all_reps = store.top_reps(&cid, None, None).unwrap();
        assert_eq!(all_reps[0].rep_name, "Ryan Park");

        assert_eq!(store.insights(&cid, "funding").unwrap().len(), 2);
        let user = store.contractor_user(&cid).unwrap().unwrap();
        assert_eq!(user.role, "Sales Manager");
    }
}
