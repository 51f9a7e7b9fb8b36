//! Static fallback content: shown whenever live generation is unavailable or fails.
//!
//! Each section's list carries exactly the `insight_type` tags from
//! [`Section::insight_types`], in the same order, so type-based card lookups work the
//! same for live and canned data.

use crate::insight::Insight;
use crate::section::Section;

/// Canned insights for a section.
pub fn fallback_insights(section: Section) -> Vec<Insight> {
    let rows: &[(&str, &str, &str)] = match section {
        Section::Sales => &[
            (
                "performance",
                "Strong Growth Trajectory",
                "Your 3.9% revenue growth and $206K monthly average demonstrate consistent market penetration. Focus on maintaining Q4 momentum by targeting the home improvement segment.",
            ),
            (
                "recommendation",
                "Expand Referral Program",
                "With 38.9% referral conversion, well above the 25% industry average, invest in formalizing your referral incentive program to drive more high-quality leads.",
            ),
            (
                "opportunity",
                "Home Remodel Expansion",
                "Home remodel projects show the highest average ticket size. Target marketing campaigns to grow this segment from 37 to 50+ projects next quarter.",
            ),
        ],
        Section::Funding => &[
            (
                "warning",
                "Pull-Through Gap",
                "59.5% approval rate is solid, but only 40.2% pull-through means you're losing nearly 20% of approved applicants. Streamline post-approval process.",
            ),
            (
                "success",
                "Healthy Portfolio",
                "3.2% delinquency rate is well within industry norms. Continue monitoring the 580-659 FICO segment.",
            ),
        ],
        Section::Benchmarks => &[
            (
                "excellence",
                "Outperforming Peers",
                "Your 22% conversion rate exceeds the 18% peer average. Shorter sales cycle (34 vs 42 days) gives you a competitive edge.",
            ),
            (
                "loyalty",
                "Strong Retention",
                "42% repeat customer rate vs 35% peers and 38.9% referral rate show strong customer relationships reducing acquisition costs.",
            ),
            (
                "growth",
                "Upsell Opportunity",
                "28% upsell rate significantly exceeds the 20% peer average. Train the full sales team on top performers' strategies.",
            ),
        ],
        Section::Projects => &[
            (
                "bottleneck",
                "Installation Bottleneck",
                "18.5 days at Install Complete stage vs 15 days for peers suggests scheduling or capacity constraints.",
            ),
            (
                "lag",
                "Contract Signing Delay",
                "4.5 days to sign contracts vs 3.8 peer avg indicates friction. Consider e-signature solutions.",
            ),
            (
                "strength",
                "Strong Top-of-Funnel",
                "68.8% submission-to-approval rate exceeds benchmarks. Pre-qualification process is effective.",
            ),
        ],
        Section::Satisfaction => &[
            (
                "installation",
                "Installation Improvement Needed",
                "Installation touchpoint has lowest recommendation rate (48%). Focus on cleanup procedures and panel alignment.",
            ),
            (
                "trend",
                "Above Average Sentiment",
                "58% recommendation rate with only 11% detractors is solid. Target the 31% neutral segment with proactive outreach.",
            ),
            (
                "post-funding",
                "Positive Post-Funding",
                "55% recommendation in post-funding with only 7% negative shows strong ongoing customer relationships.",
            ),
        ],
    };
    rows.iter()
        .map(|(kind, title, content)| Insight::new(kind, title, content))
        .collect()
}

/// Lenient variant keyed by name; unknown names get the sales list.
pub fn fallback_for(section_name: &str) -> Vec<Insight> {
    fallback_insights(Section::resolve(section_name))
}

/// Canned executive summary.
pub const FALLBACK_SUMMARY: &str = "EverGreen Climate demonstrates solid overall performance across key business areas. Revenue of $2.48M with 140 completed projects reflects consistent market penetration, supported by a strong 22% conversion rate that outpaces the 18% peer average. The 3-month consecutive growth streak and 95.2% target attainment indicate healthy momentum heading into the next quarter.

Funding health presents a mixed picture. While the 59.5% approval rate is competitive, the 40.2% pull-through rate reveals a significant gap between approved and funded projects. Addressing this post-approval drop-off represents the single largest revenue opportunity. The 3.2% delinquency rate remains well within acceptable limits, reflecting good credit screening practices.

Customer satisfaction scores are encouraging, with 58% of customers recommending EverGreen Climate and only 11% detractors. However, the installation touchpoint lags at 48% recommendation rate, signaling a need for improved on-site procedures. Project pipeline efficiency is strong at the top of funnel, though the NTP stage at 12 days and 39% expiring loan rate warrant immediate attention to prevent revenue leakage.

Strategic priorities for the next quarter should focus on three areas: (1) streamlining the post-approval funding process to close the pull-through gap, (2) implementing installation quality improvements including mandatory cleanup checklists and QC inspections, and (3) accelerating the NTP stage through workflow automation to reduce the 39% loan expiration rate.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_types_match_section_contract() {
        for section in Section::ALL {
            let types: Vec<String> = fallback_insights(section)
                .into_iter()
                .map(|i| i.insight_type)
                .collect();
            assert!(!types.is_empty());
            assert_eq!(types, section.insight_types(), "{section}");
        }
    }

    #[test]
    fn funding_has_warning_and_success() {
        let list = fallback_insights(Section::Funding);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].insight_type, "warning");
        assert_eq!(list[1].insight_type, "success");
    }

    #[test]
    fn unknown_name_gets_sales() {
        assert_eq!(fallback_for("bogus_section"), fallback_insights(Section::Sales));
    }

    #[test]
    fn summary_has_four_paragraphs() {
        assert_eq!(FALLBACK_SUMMARY.split("\n\n").count(), 4);
    }
}
