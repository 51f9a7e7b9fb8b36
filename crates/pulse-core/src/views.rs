//! Dashboard detail views that sit beside the section snapshots: the sales breakdown
//! (monthly revenue, departments, top reps, product mix) narrowed by the organization
//! and product-category filters, and the customer feedback notes.

use crate::store::{MetricsStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Filter value meaning "no filter".
pub const ALL: &str = "all";

/// Dashboard filter bar. Empty values and `"all"` select everything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFilters {
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub product_category: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
}

fn selected(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty() && *v != ALL)
}

impl DashboardFilters {
    pub fn organization(&self) -> Option<&str> {
        selected(&self.organization)
    }

    pub fn product_category(&self) -> Option<&str> {
        selected(&self.product_category)
    }

    /// Revenue rows are keyed by year; a numeric period selects that year.
    fn revenue_year(&self) -> Option<i32> {
        self.period.as_deref().and_then(|p| p.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRevenue {
    pub month: u32,
    pub actual: f64,
    pub forecast: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRow {
    pub department: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepRow {
    pub rep_name: String,
    pub department: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesDetail {
    pub revenue_monthly: Vec<MonthRevenue>,
    pub department_perf: Vec<DepartmentRow>,
    pub top_reps: Vec<RepRow>,
    pub product_mix: Vec<CategoryCount>,
}

impl SalesDetail {
    /// Monthly revenue is summed across the departments that pass the organization
    /// filter; product counts are summed per category in first-seen order.
    pub fn load(
        store: &MetricsStore,
        contractor_id: &str,
        filters: &DashboardFilters,
    ) -> Result<Self, StoreError> {
        let org = filters.organization();
        let category = filters.product_category();
        let period = filters.period.as_deref();

        let mut months: BTreeMap<u32, MonthRevenue> = BTreeMap::new();
        for row in store.revenue_monthly(contractor_id, filters.revenue_year())? {
            if org.is_some_and(|o| row.department.as_deref() != Some(o)) {
                continue;
            }
            let month = months.entry(row.month).or_insert(MonthRevenue {
                month: row.month,
                actual: 0.0,
                forecast: None,
            });
            month.actual += row.actual_revenue;
            if let Some(f) = row.forecast_revenue {
                *month.forecast.get_or_insert(0.0) += f;
            }
        }

        let department_perf = store
            .department_performance(contractor_id, period)?
            .into_iter()
            .filter(|d| org.map_or(true, |o| d.department == o))
            .map(|d| DepartmentRow {
                department: d.department,
                revenue: d.revenue,
            })
            .collect();

        let top_reps = store
            .top_reps(contractor_id, org, period)?
            .into_iter()
            .map(|r| RepRow {
                rep_name: r.rep_name,
                department: r.department,
                amount: r.amount,
            })
            .collect();

        let mut product_mix: Vec<CategoryCount> = Vec::new();
        for row in store.product_mix(contractor_id, period)? {
            if org.is_some_and(|o| row.department.as_deref() != Some(o)) {
                continue;
            }
            if category.is_some_and(|c| row.category != c) {
                continue;
            }
            match product_mix.iter_mut().find(|p| p.category == row.category) {
                Some(existing) => existing.count += row.count,
                None => product_mix.push(CategoryCount {
                    category: row.category,
                    count: row.count,
                }),
            }
        }

        Ok(Self {
            revenue_monthly: months.into_values().collect(),
            department_perf,
            top_reps,
            product_mix,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerNote {
    pub category: String,
    pub description: String,
}

/// Free-text customer feedback notes shown under the satisfaction section.
pub fn customer_notes(
    store: &MetricsStore,
    contractor_id: &str,
    period: Option<&str>,
) -> Result<Vec<CustomerNote>, StoreError> {
    Ok(store
        .customer_insights(contractor_id, period)?
        .into_iter()
        .map(|i| CustomerNote {
            category: i.category,
            description: i.description,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed;

    fn seeded() -> (MetricsStore, String, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = MetricsStore::open_path(dir.path().join("m")).unwrap();
        let cid = seed(&store).unwrap().contractor.id;
        (store, cid, dir)
    }

    fn filters(org: Option<&str>, category: Option<&str>) -> DashboardFilters {
        DashboardFilters {
            organization: org.map(String::from),
            product_category: category.map(String::from),
            period: None,
        }
    }

    #[test]
    fn unfiltered_detail_covers_every_department() {
        let (store, cid, _dir) = seeded();
        let detail = SalesDetail::load(&store, &cid, &DashboardFilters::default()).unwrap();

        assert_eq!(detail.department_perf.len(), 6);
        assert_eq!(detail.top_reps.len(), 12);
        assert_eq!(detail.top_reps[0].rep_name, "Ryan Park");
        assert_eq!(detail.product_mix.len(), 5);
        assert_eq!(detail.product_mix[0].category, "Home Improvement");
        assert_eq!(detail.product_mix[0].count, 55);

        assert_eq!(detail.revenue_monthly.len(), 12);
        assert!(detail.revenue_monthly.windows(2).all(|w| w[0].month < w[1].month));
    }

    #[test]
    fn organization_filter_narrows_every_table() {
        let (store, cid, _dir) = seeded();
        let all = SalesDetail::load(&store, &cid, &DashboardFilters::default()).unwrap();
        let ne = SalesDetail::load(&store, &cid, &filters(Some("Northeast"), None)).unwrap();

        assert_eq!(ne.department_perf, vec![DepartmentRow {
            department: "Northeast".into(),
            revenue: 420_000.0,
        }]);
        assert_eq!(ne.top_reps.len(), 2);
        assert_eq!(ne.top_reps[0].rep_name, "Sarah Chen");
        assert_eq!(ne.product_mix[0].count, 12);
        assert_eq!(ne.revenue_monthly.len(), 12);
        assert!(ne.revenue_monthly[0].actual < all.revenue_monthly[0].actual);
    }

    #[test]
    fn category_filter_and_all_sentinel() {
        let (store, cid, _dir) = seeded();
        let roofing = SalesDetail::load(&store, &cid, &filters(None, Some("Roofing"))).unwrap();
        assert_eq!(roofing.product_mix, vec![CategoryCount {
            category: "Roofing".into(),
            count: 48,
        }]);
        assert_eq!(roofing.department_perf.len(), 6);

        let sentinel = SalesDetail::load(&store, &cid, &filters(Some(ALL), Some(ALL))).unwrap();
        let unfiltered = SalesDetail::load(&store, &cid, &DashboardFilters::default()).unwrap();
        assert_eq!(sentinel, unfiltered);
    }

    #[test]
    fn other_periods_are_empty() {
        let (store, cid, _dir) = seeded();
        let f = DashboardFilters {
            period: Some("2023".into()),
            ..DashboardFilters::default()
        };
        let detail = SalesDetail::load(&store, &cid, &f).unwrap();
        assert!(detail.revenue_monthly.is_empty());
        assert!(detail.department_perf.is_empty());
        assert!(detail.product_mix.is_empty());
        assert!(customer_notes(&store, &cid, Some("2023")).unwrap().is_empty());
    }

    #[test]
    fn customer_notes_are_seeded() {
        let (store, cid, _dir) = seeded();
        let notes = customer_notes(&store, &cid, None).unwrap();
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0].category, "Site Cleanup");
    }
}
