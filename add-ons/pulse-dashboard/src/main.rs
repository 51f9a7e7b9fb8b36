//! **Pulse Dashboard**: `pulse dash <section>` prints a section's KPIs and its AI
//! insight cards; `pulse report` writes the executive report to disk.
//!
//! ## Usage
//!
//! ```text
//! pulse seed                    seed the demo contractor (idempotent)
//! pulse dash [section] [flags]  KPI table + insight cards (default: sales)
//!     --org <department>        narrow the sales breakdown to one organization
//!     --category <category>     narrow the product mix to one category
//!     --refresh                 re-read metrics and regenerate the insights once
//! pulse report [--out <path>]   compile the executive report
//! pulse --help                  print usage
//! ```
//!
//! The store is read directly at `{storage_path}/pulse_metrics`. When the gateway holds
//! the sled lock, metrics and insights are fetched from the gateway instead.

use chrono::Utc;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use pulse_core::{
    compile_report, customer_notes, seed, snapshot, DashboardFilters, GatewayClient,
    InsightGenerator, InsightHook, InsightService, MetricsStore, PulseConfig, ReportContext,
    ReportData, SalesDetail, Section,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let sub = args.get(1).map(|s| s.as_str()).unwrap_or("dash");

    let result = match sub {
        "seed" => run_seed(),
        "dash" | "status" => run_dash(DashArgs::parse(&args[2.min(args.len())..])).await,
        "report" => run_report(out_path(&args[2.min(args.len())..])).await,
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        other => Err(format!(
            "Unknown subcommand '{}'. Use: pulse seed | pulse dash [section] | pulse report | pulse --help",
            other
        )),
    };

    if let Err(e) = result {
        eprintln!("pulse {}: {}", sub, e);
        std::process::exit(1);
    }
}

fn print_help() {
    println!("Contractor Pulse Dashboard v{}", VERSION);
    println!();
    println!("Usage: pulse [COMMAND]");
    println!();
    println!("Commands:");
    println!("  seed                    Seed the demo contractor (no-op when data exists)");
    println!("  dash [section]          KPI table and AI insight cards (default: sales)");
    println!("      --org <department>      Narrow the sales breakdown to one organization");
    println!("      --category <category>   Narrow the product mix to one category");
    println!("      --refresh               Re-read metrics and regenerate insights once");
    println!("  report [--out <path>]   Write the executive performance report");
    println!("  help                    Print this help message");
    println!();
    println!(
        "Sections: {}",
        Section::ALL.map(|s| s.as_str()).join(", ")
    );
    println!("Configure via PULSE_CONFIG env var or config/pulse.toml.");
}

/// `pulse dash` arguments.
#[derive(Debug, Default, PartialEq)]
struct DashArgs {
    section: Option<String>,
    filters: DashboardFilters,
    refresh: bool,
}

impl DashArgs {
    fn parse(rest: &[String]) -> Self {
        let mut out = DashArgs::default();
        let mut iter = rest.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--org" => out.filters.organization = iter.next().cloned(),
                "--category" => out.filters.product_category = iter.next().cloned(),
                "--refresh" => out.refresh = true,
                other if out.section.is_none() && !other.starts_with('-') => {
                    out.section = Some(other.to_string())
                }
                other => tracing::warn!(arg = %other, "ignoring argument"),
            }
        }
        out
    }
}

fn out_path(rest: &[String]) -> Option<PathBuf> {
    rest.iter()
        .position(|a| a == "--out" || a == "-o")
        .and_then(|i| rest.get(i + 1))
        .map(PathBuf::from)
}

fn load_config() -> Result<PulseConfig, String> {
    PulseConfig::load().map_err(|e| format!("Config: {}", e))
}

/// Where metrics and insights come from for this run.
enum Backend {
    Local {
        store: Arc<MetricsStore>,
        contractor_id: String,
        generator: Arc<InsightGenerator>,
    },
    Gateway(GatewayClient),
}

fn open_backend(config: &PulseConfig) -> Result<Backend, String> {
    let path = config.store_path();
    match MetricsStore::open_path(&path) {
        Ok(store) => {
            let contractor_id = seed(&store)
                .map_err(|e| format!("Seed: {}", e))?
                .contractor
                .id;
            Ok(Backend::Local {
                store: Arc::new(store),
                contractor_id,
                generator: Arc::new(InsightGenerator::from_config(&config.llm)),
            })
        }
        Err(e) => {
            let msg = e.to_string();
            if msg.contains("lock") || msg.contains("WouldBlock") {
                tracing::info!(gateway = %config.gateway_url, "store locked; using gateway");
                Ok(Backend::Gateway(GatewayClient::new(&config.gateway_url, GATEWAY_TIMEOUT)))
            } else {
                Err(format!("Cannot open metrics store at {}: {}", path.display(), e))
            }
        }
    }
}

fn run_seed() -> Result<(), String> {
    let config = load_config()?;
    let path = config.store_path();
    let store = MetricsStore::open_path(&path)
        .map_err(|e| format!("Cannot open metrics store at {}: {}", path.display(), e))?;
    let outcome = seed(&store).map_err(|e| format!("Seed: {}", e))?;
    if outcome.created {
        println!("Seeded {} ({})", outcome.contractor.name, outcome.contractor.id);
    } else {
        println!("Data already seeded: {} ({})", outcome.contractor.name, outcome.contractor.id);
    }
    Ok(())
}

async fn run_dash(args: DashArgs) -> Result<(), String> {
    let section: Section = args
        .section
        .as_deref()
        .unwrap_or("sales")
        .parse()
        .map_err(|e| format!("{}", e))?;
    let config = load_config()?;
    let backend = open_backend(&config)?;

    let metrics = section_metrics(&backend, section).await?;
    let service: Arc<dyn InsightService> = match &backend {
        Backend::Local { generator, .. } => generator.clone() as Arc<dyn InsightService>,
        Backend::Gateway(client) => Arc::new(client.clone()) as Arc<dyn InsightService>,
    };

    let now = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    println!();
    println!("  {} :: {}  ({})", config.app_name, section.title(), now);
    println!();
    print_kpis(&metrics);
    print_detail(&section_detail(&backend, section, &args.filters).await?);

    let hook = InsightHook::new(service, section.as_str(), metrics);
    hook.mount().await;
    print_insight_cards(&hook, section).await;
    print_toast(&hook).await;

    if args.refresh {
        hook.set_metrics(section_metrics(&backend, section).await?).await;
        match hook.refresh().await {
            Some(_) => {
                println!("  Refreshed insights");
                println!();
                print_insight_cards(&hook, section).await;
                print_toast(&hook).await;
            }
            None => println!("  Refresh skipped; insights still loading"),
        }
    }
    Ok(())
}

async fn print_toast(hook: &InsightHook) {
    if let Some(message) = hook.message().await {
        println!("  [!] {}", message);
        println!();
    }
}

async fn section_metrics(backend: &Backend, section: Section) -> Result<Value, String> {
    match backend {
        Backend::Local {
            store,
            contractor_id,
            ..
        } => {
            let data = ReportData::collect(&**store, contractor_id, None);
            Ok(snapshot::for_section(section, &data))
        }
        Backend::Gateway(client) => fetch_metrics(client.base_url(), section).await,
    }
}

/// Breakdown tables shown under the KPIs: the sales detail and the customer notes.
async fn section_detail(
    backend: &Backend,
    section: Section,
    filters: &DashboardFilters,
) -> Result<Value, String> {
    match (section, backend) {
        (
            Section::Sales,
            Backend::Local {
                store,
                contractor_id,
                ..
            },
        ) => {
            let detail = SalesDetail::load(store, contractor_id, filters).map_err(|e| e.to_string())?;
            serde_json::to_value(detail).map_err(|e| e.to_string())
        }
        (
            Section::Satisfaction,
            Backend::Local {
                store,
                contractor_id,
                ..
            },
        ) => {
            let notes = customer_notes(store, contractor_id, None).map_err(|e| e.to_string())?;
            Ok(serde_json::json!({ "customerInsights": notes }))
        }
        (Section::Sales, Backend::Gateway(client)) => {
            let mut query = Vec::new();
            if let Some(org) = filters.organization() {
                query.push(("organization", org));
            }
            if let Some(category) = filters.product_category() {
                query.push(("productCategory", category));
            }
            fetch_json(&format!("{}/api/sales/detail", client.base_url()), &query).await
        }
        (Section::Satisfaction, Backend::Gateway(client)) => {
            let url = format!("{}/api/satisfaction/notes", client.base_url());
            let notes = fetch_json(&url, &[]).await?;
            Ok(serde_json::json!({ "customerInsights": notes }))
        }
        _ => Ok(Value::Null),
    }
}

fn print_detail(detail: &Value) {
    let Some(map) = detail.as_object() else { return };
    for (key, value) in map {
        if let Some(rows) = value.as_array() {
            print_rows(key, rows);
        }
    }
}

async fn fetch_json(url: &str, query: &[(&str, &str)]) -> Result<Value, String> {
    let resp = reqwest::Client::new()
        .get(url)
        .query(query)
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(|e| format!("Gateway unreachable at {} ({}). Start the gateway first.", url, e))?;
    if !resp.status().is_success() {
        return Err(format!("Gateway API error {} for {}", resp.status(), url));
    }
    resp.json()
        .await
        .map_err(|e| format!("Invalid JSON from gateway: {}", e))
}

async fn fetch_metrics(base_url: &str, section: Section) -> Result<Value, String> {
    let body = fetch_json(&format!("{}/api/metrics/{}", base_url, section), &[]).await?;
    Ok(body.get("metrics").cloned().unwrap_or(Value::Null))
}

fn display_value(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Scalar fields as a KPI table; nested arrays print as their own tables.
fn print_kpis(metrics: &Value) {
    let Some(map) = metrics.as_object() else { return };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value")
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
        ]);
    let mut scalars = 0;
    for (key, value) in map {
        if let Some(text) = display_value(value) {
            table.add_row(vec![
                Cell::new(key),
                Cell::new(text).set_alignment(CellAlignment::Right),
            ]);
            scalars += 1;
        }
    }
    if scalars > 0 {
        println!("{table}");
        println!();
    }

    for (key, value) in map {
        if let Some(rows) = value.as_array() {
            print_rows(key, rows);
        }
    }
}

fn print_rows(title: &str, rows: &[Value]) {
    let Some(first) = rows.first().and_then(Value::as_object) else { return };
    let columns: Vec<&String> = first.keys().collect();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            columns
                .iter()
                .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    for row in rows {
        table.add_row(
            columns
                .iter()
                .map(|c| Cell::new(row.get(c.as_str()).and_then(display_value).unwrap_or_default()))
                .collect::<Vec<_>>(),
        );
    }
    println!("  {}", title);
    println!("{table}");
    println!();
}

async fn print_insight_cards(hook: &InsightHook, section: Section) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Insight").add_attribute(Attribute::Bold),
            Cell::new("").add_attribute(Attribute::Bold),
        ]);

    for insight_type in section.insight_types() {
        let (title, content, color) = match hook.insight(insight_type).await {
            Some(i) => (i.title, i.content, Color::Green),
            None => (
                "No insight available".to_string(),
                "Refresh to try again.".to_string(),
                Color::DarkGrey,
            ),
        };
        table.add_row(vec![
            Cell::new(insight_type).fg(Color::Cyan),
            Cell::new(format!("{}\n{}", title, content)).fg(color),
        ]);
    }
    println!("{table}");
    println!();
}

async fn run_report(out: Option<PathBuf>) -> Result<(), String> {
    let config = load_config()?;
    let (text, file_name) = match open_backend(&config)? {
        Backend::Local {
            store,
            contractor_id,
            generator,
        } => {
            let contractor = store
                .contractor(&contractor_id)
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("Contractor {} not found", contractor_id))?;
            let user = store.contractor_user(&contractor_id).map_err(|e| e.to_string())?;
            let ctx = ReportContext::new(&contractor, user.as_ref(), None);
            let report = compile_report(store.as_ref(), generator.as_ref(), &ctx).await;
            for field in &report.degraded {
                eprintln!("  [!] {} unavailable; used default values", field);
            }
            (report.render(), report.file_name())
        }
        Backend::Gateway(client) => {
            let url = format!("{}/api/report", client.base_url());
            let resp = reqwest::Client::new()
                .get(&url)
                .timeout(GATEWAY_TIMEOUT)
                .send()
                .await
                .map_err(|e| format!("Gateway unreachable at {} ({})", url, e))?;
            if !resp.status().is_success() {
                return Err(format!("Report API error {}", resp.status()));
            }
            let text = resp.text().await.map_err(|e| e.to_string())?;
            (text, format!("performance-report-{}.txt", Utc::now().format("%Y-%m-%d")))
        }
    };

    let path = out.unwrap_or_else(|| PathBuf::from(file_name));
    std::fs::write(&path, text).map_err(|e| format!("Write {}: {}", path.display(), e))?;
    println!("Report written to {}", path.display());
    Ok(())
}
