//! MetricsSnapshot builders: the JSON a generation call sees for a section.

use crate::report_data::ReportData;
use crate::section::Section;
use serde_json::{json, Value};

fn to_value<T: serde::Serialize>(v: &T) -> Value {
    serde_json::to_value(v).unwrap_or(Value::Null)
}

/// Snapshot for one section. Benchmarks are wrapped as `{ "metrics": [...] }`.
pub fn for_section(section: Section, data: &ReportData) -> Value {
    match section {
        Section::Sales => to_value(&data.sales),
        Section::Funding => to_value(&data.funding),
        Section::Benchmarks => json!({ "metrics": to_value(&data.benchmarks) }),
        Section::Projects => projects(data),
        Section::Satisfaction => satisfaction(data),
    }
}

fn projects(data: &ReportData) -> Value {
    json!({
        "pipeline": to_value(&data.projects.pipeline_stages),
        "expiringPct": data.projects.expiring_pct,
        "expiredValue": data.projects.expired_value,
    })
}

fn satisfaction(data: &ReportData) -> Value {
    let mut v = to_value(&data.satisfaction);
    if let Value::Object(map) = &mut v {
        map.insert("touchpoints".to_string(), to_value(&data.touchpoints));
    }
    v
}

/// Combined snapshot for the executive summary.
pub fn all(data: &ReportData) -> Value {
    json!({
        "sales": to_value(&data.sales),
        "funding": to_value(&data.funding),
        "benchmarks": to_value(&data.benchmarks),
        "projects": projects(data),
        "satisfaction": satisfaction(data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_shapes() {
        let data = ReportData::default();
        let b = for_section(Section::Benchmarks, &data);
        assert_eq!(b["metrics"].as_array().map(Vec::len), Some(7));

        let s = for_section(Section::Satisfaction, &data);
        assert_eq!(s["wouldRecommendPct"], 58.0);
        assert_eq!(s["touchpoints"].as_array().map(Vec::len), Some(4));

        let p = for_section(Section::Projects, &data);
        assert_eq!(p["expiringPct"], 39.0);
        assert!(p.get("actionItems").is_none());
    }

    #[test]
    fn combined_snapshot_has_every_section() {
        let v = all(&ReportData::default());
        for key in ["sales", "funding", "benchmarks", "projects", "satisfaction"] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        assert!(v["benchmarks"].is_array());
    }
}
