use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pulse_core::{
    compile_report, customer_notes, fallback_insights, records::StoredInsight, snapshot,
    CustomerNote, DashboardFilters, GenerationResult, InsightGenerator, MetricsStore,
    PulseConfig, ReportContext, ReportData, SalesDetail, Section, SummaryResult,
    MSG_GENERATION_FAILED,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

type ApiError = (StatusCode, String);

pub struct AppState {
    pub config: PulseConfig,
    pub store: Arc<MetricsStore>,
    pub generator: Arc<InsightGenerator>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ai", post(generate_insights))
        .route("/api/ai/summary", post(generate_summary))
        .route("/api/contractor", get(contractor_handler))
        .route("/api/metrics/:section", get(metrics_handler))
        .route("/api/insights/:section", get(stored_insights_handler))
        .route("/api/sales/detail", get(sales_detail_handler))
        .route("/api/satisfaction/notes", get(customer_notes_handler))
        .route("/api/report", get(report_handler))
        .with_state(state)
        .layer(axum::middleware::from_fn(log_requests))
}

async fn log_requests(request: Request<Body>, next: Next) -> Response {
    tracing::info!(method = %request.method(), path = %request.uri().path(), "[PULSE] request");
    next.run(request).await
}

async fn health() -> &'static str {
    "OK"
}

fn internal(e: impl std::fmt::Display) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[derive(Deserialize)]
struct SummaryRequest {
    #[serde(default)]
    metrics: Value,
}

#[derive(Deserialize)]
struct PeriodQuery {
    #[serde(default)]
    period: Option<String>,
}

fn or_empty(metrics: Value) -> Value {
    if metrics.is_null() {
        json!({})
    } else {
        metrics
    }
}

/// Section name from a request body. `None` when absent, null or empty; other
/// non-string values are passed on as text and alias to sales downstream.
fn section_field(body: &Value) -> Option<String> {
    match body.get("section")? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// POST /api/ai: always 200 with a result (live or fallback); 400 only without `section`.
/// The body is read as raw bytes so content type and field types never reject a request.
async fn generate_insights(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<GenerationResult>, ApiError> {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(target: "pulse::gateway", error = %e, "unreadable /api/ai body; sales fallback");
            return Ok(Json(GenerationResult::fallback(
                fallback_insights(Section::Sales),
                MSG_GENERATION_FAILED,
            )));
        }
    };
    let section = section_field(&body).ok_or((
        StatusCode::BAD_REQUEST,
        "Missing required field: section".to_string(),
    ))?;
    let metrics = body.get("metrics").cloned().unwrap_or(Value::Null);
    let result = state.generator.generate(&section, &or_empty(metrics)).await;
    Ok(Json(result))
}

async fn generate_summary(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SummaryRequest>,
) -> Json<SummaryResult> {
    Json(state.generator.generate_summary(&or_empty(body.metrics)).await)
}

fn default_contractor_id(state: &AppState) -> Result<String, ApiError> {
    state
        .store
        .default_contractor()
        .map_err(internal)?
        .map(|c| c.id)
        .ok_or((StatusCode::NOT_FOUND, "No contractor seeded".to_string()))
}

fn parse_section(name: &str) -> Result<Section, ApiError> {
    name.parse::<Section>()
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))
}

async fn contractor_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let contractor = state
        .store
        .default_contractor()
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "No contractor seeded".to_string()))?;
    let user = state.store.contractor_user(&contractor.id).map_err(internal)?;
    Ok(Json(json!({ "contractor": contractor, "user": user })))
}

#[derive(Serialize)]
struct MetricsResponse {
    section: Section,
    period: Option<String>,
    metrics: Value,
    degraded: Vec<&'static str>,
}

/// GET /api/metrics/:section: the snapshot a generation call for this section would see.
async fn metrics_handler(
    State(state): State<Arc<AppState>>,
    Path(section): Path<String>,
    Query(q): Query<PeriodQuery>,
) -> Result<Json<MetricsResponse>, ApiError> {
    let section = parse_section(&section)?;
    let cid = default_contractor_id(&state)?;
    let data = ReportData::collect(state.store.as_ref(), &cid, q.period.as_deref());
    Ok(Json(MetricsResponse {
        section,
        period: q.period,
        metrics: snapshot::for_section(section, &data),
        degraded: data.degraded,
    }))
}

/// GET /api/sales/detail?organization=&productCategory=&period=
async fn sales_detail_handler(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<DashboardFilters>,
) -> Result<Json<SalesDetail>, ApiError> {
    let cid = default_contractor_id(&state)?;
    let detail = SalesDetail::load(&state.store, &cid, &filters).map_err(internal)?;
    Ok(Json(detail))
}

async fn customer_notes_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PeriodQuery>,
) -> Result<Json<Vec<CustomerNote>>, ApiError> {
    let cid = default_contractor_id(&state)?;
    let notes = customer_notes(&state.store, &cid, q.period.as_deref()).map_err(internal)?;
    Ok(Json(notes))
}

async fn stored_insights_handler(
    State(state): State<Arc<AppState>>,
    Path(section): Path<String>,
) -> Result<Json<Vec<StoredInsight>>, ApiError> {
    let section = parse_section(&section)?;
    let cid = default_contractor_id(&state)?;
    let rows = state
        .store
        .insights(&cid, section.as_str())
        .map_err(internal)?;
    Ok(Json(rows))
}

/// GET /api/report: compiled report as a text attachment.
async fn report_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PeriodQuery>,
) -> Result<Response, ApiError> {
    let contractor = state
        .store
        .default_contractor()
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "No contractor seeded".to_string()))?;
    let user = state.store.contractor_user(&contractor.id).map_err(internal)?;
    let ctx = ReportContext::new(&contractor, user.as_ref(), q.period.as_deref());

    let report = compile_report(state.store.as_ref(), state.generator.as_ref(), &ctx).await;
    let disposition = format!("attachment; filename=\"{}\"", report.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.render(),
    )
        .into_response())
}
