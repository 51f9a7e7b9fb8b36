//! Section insight prompts.
//!
//! Each template names the insight count, the ordered `insight_type` tags (taken from
//! [`Section::insight_types`]), one line on what each should cover, the 1-2 sentence
//! length rule, and the JSON-array-only output rule.

use crate::section::Section;

/// System instruction fixing the assistant's domain.
pub const INSIGHTS_SYSTEM: &str = "You are an analytics advisor for solar and home improvement contractors using the GoodLeap platform. Provide actionable, data-driven insights. Be concise and specific.";

struct Template {
    subject: &'static str,
    /// (heading, focus) per insight type, same order as `Section::insight_types`.
    coverage: &'static [(&'static str, &'static str)],
}

fn template(section: Section) -> Template {
    match section {
        Section::Sales => Template {
            subject: "sales performance metrics",
            coverage: &[
                ("A Sales Performance Insight", "about current revenue trends"),
                ("A Top Recommendation", "for improving sales"),
                ("A Market Opportunity", "they should pursue"),
            ],
        },
        Section::Funding => Template {
            subject: "funding and loan metrics",
            coverage: &[
                ("An Approval Alert", "about funding pipeline risks or issues"),
                ("A Portfolio Health insight", "about positive indicators"),
            ],
        },
        Section::Benchmarks => Template {
            subject: "benchmark comparison metrics (contractor vs peers)",
            coverage: &[
                ("A Sales Excellence insight", "about where they outperform"),
                ("A Customer Loyalty insight", "about retention and referrals"),
                ("A Growth Potential insight", "about upsell or expansion"),
            ],
        },
        Section::Projects => Template {
            subject: "project pipeline metrics",
            coverage: &[
                ("A Bottleneck Detection insight", "about pipeline slowdowns"),
                ("An Efficiency Insight", "about process delays"),
                ("A Stage Optimization insight", "about what works well"),
            ],
        },
        Section::Satisfaction => Template {
            subject: "customer satisfaction and NPS metrics",
            coverage: &[
                ("An Installation Experience insight", "about that touchpoint"),
                ("An Overall Trend insight", "about sentiment direction"),
                ("An Improvement Priority", "for the post-funding experience"),
            ],
        },
    }
}

/// Prompt for a known section. Deterministic for a given (section, metrics) pair.
pub fn build_section_prompt(section: Section, metrics: &serde_json::Value) -> String {
    let t = template(section);
    let types = section.insight_types();
    let count = types.len();

    let mut prompt = format!(
        "Analyze these {} for a GoodLeap contractor:\n{}\n\n",
        t.subject,
        super::metrics_json(metrics)
    );
    prompt.push_str(&format!(
        "Provide exactly {count} insights as a JSON array. Each object must have: insight_type, title, content.\n"
    ));
    prompt.push_str(&format!("The {count} insights should cover:\n"));
    for (i, (kind, (heading, focus))) in types.iter().zip(t.coverage).enumerate() {
        prompt.push_str(&format!(
            "{}. insight_type: \"{}\" - {} {}\n",
            i + 1,
            kind,
            heading,
            focus
        ));
    }
    prompt.push_str("\nKeep each content field to 1-2 sentences. Be specific with numbers from the data.\n");
    prompt.push_str("Respond with ONLY the JSON array, no other text.");
    prompt
}

/// Prompt keyed by section name; unknown names silently get the sales template.
pub fn build_prompt(section_name: &str, metrics: &serde_json::Value) -> String {
    build_section_prompt(Section::resolve(section_name), metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_lists_every_type_in_order() {
        for section in Section::ALL {
            let prompt = build_section_prompt(section, &json!({}));
            let mut last = 0;
            for kind in section.insight_types() {
                let needle = format!("insight_type: \"{kind}\"");
                let at = prompt.find(&needle).unwrap_or_else(|| panic!("{section}: {kind}"));
                assert!(at >= last);
                last = at;
            }
            assert!(prompt.contains(&format!("exactly {} insights", section.insight_count())));
            assert!(prompt.ends_with("Respond with ONLY the JSON array, no other text."));
        }
    }

    #[test]
    fn empty_metrics_still_requests_full_count() {
        let prompt = build_section_prompt(Section::Funding, &json!({}));
        assert!(prompt.contains("{}"));
        assert!(prompt.contains("exactly 2 insights"));
    }

    #[test]
    fn metrics_are_pretty_printed() {
        let prompt = build_section_prompt(Section::Funding, &json!({"approvalRate": "59.5%"}));
        assert!(prompt.contains("\"approvalRate\": \"59.5%\""));
    }

    #[test]
    fn unknown_section_uses_sales_template() {
        let m = json!({"a": 1});
        assert_eq!(build_prompt("bogus_section", &m), build_prompt("sales", &m));
    }

    #[test]
    fn deterministic() {
        let m = json!({"x": [1, 2, 3], "y": {"z": "w"}});
        assert_eq!(build_prompt("projects", &m), build_prompt("projects", &m));
    }
}
