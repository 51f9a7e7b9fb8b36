//! Executive summary prompt: 3-4 paragraphs over every section's metrics.

/// System instruction for the summary model.
pub const SUMMARY_SYSTEM: &str = "You are an analytics advisor for solar and home improvement contractors using the GoodLeap platform. Write clear, professional executive summaries.";

/// User prompt template: `{metrics_json}` is replaced with the combined snapshot.
pub const SUMMARY_USER_TEMPLATE: &str = r#"Given these contractor performance metrics across all business areas:
{metrics_json}

Write a 3-4 paragraph executive summary for a performance report. Cover:
1. Overall business health and revenue performance
2. Key strengths and competitive advantages
3. Areas of concern requiring attention
4. Strategic recommendations for the next quarter

Be specific with numbers from the data. Write in a professional, concise style suitable for executive leadership.
Respond with ONLY the summary text, no headers or formatting."#;

pub fn summary_user_prompt(metrics: &serde_json::Value) -> String {
    SUMMARY_USER_TEMPLATE.replace("{metrics_json}", &super::metrics_json(metrics))
}
