//! Executive report: cover, summary, and one page per section.
//!
//! Output is plain text. Pages are separated by a form feed and tables are drawn with
//! comfy-table. Metrics come from [`ReportData::collect`], so a failed read only
//! affects its own field. The five insight calls and the summary call run concurrently.

use crate::hook::InsightService;
use crate::insight::{GenerationResult, Insight, InsightSource};
use crate::records::{Contractor, User};
use crate::report_data::ReportData;
use crate::section::Section;
use crate::snapshot;
use crate::store::MetricsSource;
use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

pub const MAX_INSIGHTS_PER_PAGE: usize = 3;
pub const PAGE_BREAK: char = '\x0c';
const TABLE_WIDTH: u16 = 96;

/// Who the report is for and which data it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContext {
    pub contractor_id: String,
    pub company: String,
    pub prepared_for: String,
    pub period: Option<String>,
}

impl ReportContext {
    pub fn new(contractor: &Contractor, user: Option<&User>, period: Option<&str>) -> Self {
        let prepared_for = match user {
            Some(u) => format!("{} | {}", u.name, u.role),
            None => contractor.greeting_name.clone(),
        };
        Self {
            contractor_id: contractor.id.clone(),
            company: contractor.name.clone(),
            prepared_for,
            period: period.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub pages: Vec<String>,
    pub generated_at: DateTime<Utc>,
    /// Metric fields that used hardcoded values.
    pub degraded: Vec<&'static str>,
    /// Sections whose insights came from the fallback table.
    pub fallback_sections: Vec<Section>,
    pub summary_source: InsightSource,
}

impl Report {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn render(&self) -> String {
        self.pages.join(&PAGE_BREAK.to_string())
    }

    pub fn file_name(&self) -> String {
        format!("performance-report-{}.txt", self.generated_at.format("%Y-%m-%d"))
    }
}

pub async fn compile_report(
    source: &dyn MetricsSource,
    service: &dyn InsightService,
    ctx: &ReportContext,
) -> Report {
    let data = ReportData::collect(source, &ctx.contractor_id, ctx.period.as_deref());
    let snaps = Section::ALL.map(|s| snapshot::for_section(s, &data));
    let combined = snapshot::all(&data);

    let (sales, funding, benchmarks, projects, satisfaction, summary) = tokio::join!(
        service.generate(Section::Sales.as_str(), &snaps[0]),
        service.generate(Section::Funding.as_str(), &snaps[1]),
        service.generate(Section::Benchmarks.as_str(), &snaps[2]),
        service.generate(Section::Projects.as_str(), &snaps[3]),
        service.generate(Section::Satisfaction.as_str(), &snaps[4]),
        service.summary(&combined),
    );
    let results = [sales, funding, benchmarks, projects, satisfaction];
    let fallback_sections = Section::ALL
        .into_iter()
        .zip(results.iter())
        .filter(|(_, r)| r.is_fallback())
        .map(|(s, _)| s)
        .collect::<Vec<_>>();

    let generated_at = Utc::now();
    let [sales, funding, benchmarks, projects, satisfaction] = results;
    let mut pages = vec![
        cover_page(ctx, generated_at),
        summary_page(&summary.summary),
        sales_page(&data, &sales),
        funding_page(&data, &funding),
        benchmarks_page(&data, &benchmarks),
        projects_page(&data, &projects),
        satisfaction_page(&data, &satisfaction),
    ];
    add_footers(&mut pages, &ctx.company);

    tracing::info!(
        target: "pulse::report",
        pages = pages.len(),
        degraded = data.degraded.len(),
        fallback_sections = fallback_sections.len(),
        "report compiled"
    );
    Report {
        pages,
        generated_at,
        degraded: data.degraded,
        fallback_sections,
        summary_source: summary.source,
    }
}

// ── formatting ──────────────────────────────────────────────────────────────

/// Integer-valued numbers print without a decimal point.
fn num(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

fn with_commas(v: f64) -> String {
    let rounded = v.abs().round() as u64;
    let digits = rounded.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn money(v: f64) -> String {
    format!("${}", with_commas(v))
}

fn signed(v: f64) -> &'static str {
    if v > 0.0 {
        "+"
    } else {
        ""
    }
}

fn table(header: &[&str]) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(TABLE_WIDTH)
        .set_header(header.iter().map(|h| Cell::new(h)).collect::<Vec<_>>());
    t
}

fn metric_table(rows: &[(&str, String)]) -> String {
    let mut t = table(&["Metric", "Value"]);
    for (label, value) in rows {
        t.add_row(vec![
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    t.to_string()
}

fn page_header(title: &str) -> String {
    format!("{}\n{}\n\n", title, "=".repeat(title.len()))
}

fn sub_header(out: &mut String, title: &str) {
    out.push_str(&format!("\n{}\n{}\n", title, "-".repeat(title.len())));
}

fn insight_blocks(out: &mut String, result: &GenerationResult) {
    sub_header(out, "AI Insights");
    let shown: &[Insight] = &result.insights[..result.insights.len().min(MAX_INSIGHTS_PER_PAGE)];
    for (i, insight) in shown.iter().enumerate() {
        out.push_str(&format!("{}. {}\n   {}\n", i + 1, insight.title, insight.content));
    }
}

// ── pages ───────────────────────────────────────────────────────────────────

fn cover_page(ctx: &ReportContext, at: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n\n{}\n\n", ctx.company));
    out.push_str("Executive Performance Report\n");
    out.push_str(&format!("{}\n\n", at.format("%B %-d, %Y")));
    out.push_str("Report Contents\n");
    let contents = std::iter::once("Executive Summary").chain(Section::ALL.iter().map(|s| s.title()));
    for (i, title) in contents.enumerate() {
        out.push_str(&format!("  {}.  {}\n", i + 1, title));
    }
    out.push_str(&format!("\nPrepared for {}\n", ctx.prepared_for));
    out
}

fn summary_page(summary: &str) -> String {
    let mut out = page_header("Executive Summary");
    for para in summary.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        out.push_str(para);
        out.push_str("\n\n");
    }
    out
}

fn sales_page(data: &ReportData, insights: &GenerationResult) -> String {
    let m = &data.sales;
    let mut out = page_header(Section::Sales.title());
    out.push_str(&metric_table(&[
        ("Total Revenue", money(m.revenue)),
        ("Projects Completed", m.projects.to_string()),
        ("Average Sale", money(m.avg_sale)),
        ("Conversion Rate", format!("{}%", num(m.conversion_rate))),
        ("Referral Conversion", format!("{}%", num(m.referral_conversion))),
        ("Repeat Customer Rate", format!("{}%", num(m.repeat_rate))),
        ("Upsell Rate", format!("{}%", num(m.upsell_rate))),
        ("Avg Sales Cycle", format!("{} days", num(m.avg_sales_cycle))),
        ("Cancellations", m.cancellations.to_string()),
        ("Target Attainment", format!("{}%", m.target_attainment)),
    ]));
    out.push('\n');
    insight_blocks(&mut out, insights);
    out
}

fn funding_page(data: &ReportData, insights: &GenerationResult) -> String {
    let m = &data.funding;
    let mut out = page_header(Section::Funding.title());
    out.push_str(&metric_table(&[
        ("Approval Rate", format!("{}%", num(m.approval_rate))),
        ("Sales Pull-Through", format!("{}%", num(m.pull_through))),
        ("Delinquency Rate", format!("{}%", num(m.delinquency_rate))),
        ("Payment Status", m.payment_status.clone()),
        ("Average Loan", money(m.avg_loan)),
        ("Utilization Rate", format!("{}%", num(m.utilization_rate))),
        ("Total Funded", money(m.total_funded)),
    ]));
    out.push('\n');

    sub_header(&mut out, "FICO Score Distribution");
    let mut t = table(&["FICO Range", "Approval Probability"]);
    for f in &data.fico_distribution {
        t.add_row(vec![
            Cell::new(&f.fico_range),
            Cell::new(format!("{}%", num(f.approval_probability))).set_alignment(CellAlignment::Right),
        ]);
    }
    out.push_str(&t.to_string());
    out.push('\n');
    insight_blocks(&mut out, insights);
    out
}

fn benchmarks_page(data: &ReportData, insights: &GenerationResult) -> String {
    let mut out = page_header(Section::Benchmarks.title());
    let mut t = table(&["Metric", "Your Value", "Peer Average", "Difference"]);
    for b in &data.benchmarks {
        let diff = b.difference();
        let (value, peer, diff_str) = match b.metric_name.as_str() {
            "Avg Sale" => (
                money(b.contractor_value),
                money(b.peer_value),
                format!("{}{}", if diff < 0.0 { "-" } else { signed(diff) }, money(diff)),
            ),
            "Avg Sales Cycle" => (
                format!("{} days", num(b.contractor_value)),
                format!("{} days", num(b.peer_value)),
                format!("{}{} days", signed(diff), num(diff)),
            ),
            _ => (
                format!("{}%", num(b.contractor_value)),
                format!("{}%", num(b.peer_value)),
                format!("{}{:.1}%", signed(diff), diff),
            ),
        };
        t.add_row(vec![
            Cell::new(&b.metric_name),
            Cell::new(value).set_alignment(CellAlignment::Right),
            Cell::new(peer).set_alignment(CellAlignment::Right),
            Cell::new(diff_str).set_alignment(CellAlignment::Right),
        ]);
    }
    out.push_str(&t.to_string());
    out.push('\n');
    insight_blocks(&mut out, insights);
    out
}

fn projects_page(data: &ReportData, insights: &GenerationResult) -> String {
    let pm = &data.projects;
    let mut out = page_header(Section::Projects.title());
    let mut t = table(&["Stage", "Count", "Avg Days", "Peer Avg Days", "Difference"]);
    for s in &pm.pipeline_stages {
        let diff = s.difference();
        t.add_row(vec![
            Cell::new(&s.stage),
            Cell::new(s.count).set_alignment(CellAlignment::Right),
            Cell::new(num(s.avg_days)).set_alignment(CellAlignment::Right),
            Cell::new(num(s.peer_avg_days)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{}{:.1} days", signed(diff), diff)).set_alignment(CellAlignment::Right),
        ]);
    }
    out.push_str(&t.to_string());
    out.push_str(&format!(
        "\n\nExpiring Loans: {}%    |    Expired Value: {}\n",
        num(pm.expiring_pct),
        money(pm.expired_value)
    ));

    if !pm.action_items.is_empty() {
        sub_header(&mut out, "Action Items");
        let mut t = table(&["Stage", "Action", "Projects", "Risk"]);
        for a in &pm.action_items {
            t.add_row(vec![
                Cell::new(&a.stage),
                Cell::new(&a.action_text),
                Cell::new(a.project_count).set_alignment(CellAlignment::Right),
                Cell::new(a.risk_level.to_uppercase()).set_alignment(CellAlignment::Center),
            ]);
        }
        out.push_str(&t.to_string());
        out.push('\n');
    }
    insight_blocks(&mut out, insights);
    out
}

fn satisfaction_page(data: &ReportData, insights: &GenerationResult) -> String {
    let sm = &data.satisfaction;
    let mut out = page_header(Section::Satisfaction.title());
    out.push_str(&metric_table(&[
        ("Would Recommend", format!("{}%", num(sm.would_recommend_pct))),
        ("Neutral", format!("{}%", num(sm.neutral_pct))),
        ("Would Not Recommend", format!("{}%", num(sm.would_not_recommend_pct))),
        ("Open Issues", sm.open_issues.to_string()),
        ("Defective Projects", sm.defective_projects.to_string()),
        ("Defective Rate", format!("{}%", num(sm.defective_rate))),
        ("Escalations", sm.escalations.to_string()),
    ]));
    out.push('\n');

    sub_header(&mut out, "Recommendation by Touchpoint");
    let mut t = table(&["Touchpoint", "Recommend", "Neutral", "Not Recommend"]);
    for tp in &data.touchpoints {
        t.add_row(vec![
            Cell::new(&tp.touchpoint),
            Cell::new(format!("{}%", num(tp.recommend_pct))).set_alignment(CellAlignment::Right),
            Cell::new(format!("{}%", num(tp.neutral_pct))).set_alignment(CellAlignment::Right),
            Cell::new(format!("{}%", num(tp.not_recommend_pct))).set_alignment(CellAlignment::Right),
        ]);
    }
    out.push_str(&t.to_string());
    out.push('\n');
    insight_blocks(&mut out, insights);
    out
}

/// Footer on every page but the cover; numbering starts after the cover.
fn add_footers(pages: &mut [String], company: &str) {
    let total = pages.len().saturating_sub(1);
    for (i, page) in pages.iter_mut().enumerate().skip(1) {
        page.push_str(&format!(
            "\n{} | Performance Report{:>width$}\n",
            company,
            format!("Page {i} of {total}"),
            width = 40
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_formatting() {
        assert_eq!(money(2_475_700.0), "$2,475,700");
        assert_eq!(money(999.0), "$999");
        assert_eq!(money(-2483.0), "$2,483");
        assert_eq!(num(22.0), "22");
        assert_eq!(num(38.9), "38.9");
    }

    #[test]
    fn footers_skip_cover() {
        let mut pages = vec!["cover".to_string(), "a".to_string(), "b".to_string()];
        add_footers(&mut pages, "Acme");
        assert_eq!(pages[0], "cover");
        assert!(pages[1].contains("Acme | Performance Report"));
        assert!(pages[1].contains("Page 1 of 2"));
        assert!(pages[2].contains("Page 2 of 2"));
    }

    #[test]
    fn insight_blocks_are_capped() {
        let result = GenerationResult::ai(
            (1..=5)
                .map(|i| Insight::new("t", &format!("Title {i}"), "c"))
                .collect(),
        );
        let mut out = String::new();
        insight_blocks(&mut out, &result);
        assert!(out.contains("Title 3"));
        assert!(!out.contains("Title 4"));
    }
}
