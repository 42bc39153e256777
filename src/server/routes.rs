use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AppState;
use crate::analysis::{
    self, build_price_trend, summarize, ComparisonResult, DemandPoint, LocalityReport, PricePoint,
    RANKING_KEY,
};
use crate::data::export::to_csv;
use crate::data::filter::filter_by_locality;
use crate::data::model::Dataset;
use crate::error::ApiError;
use crate::query::extract_locality;
use crate::report::{render_chart_png, render_pdf};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub localities: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocalityRequest {
    #[serde(default)]
    pub locality: String,
}

#[derive(Debug, Serialize)]
pub struct TrendCharts {
    pub price_trend: Vec<PricePoint>,
    pub demand_trend: Vec<DemandPoint>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub locality: String,
    pub query: String,
    pub summary: String,
    pub chart: TrendCharts,
    pub table: Value,
    pub count: usize,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Extract a locality from a free-text query and return its summary,
/// trends and the first rows of the matching table.
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let query = body(payload)?.query.trim().to_string();
    if query.is_empty() {
        return Err(ApiError::BadInput("query is required".into()));
    }
    let locality = extract_locality(&query);
    if locality.is_empty() {
        return Err(ApiError::BadInput(format!(
            "could not find a locality in '{query}'"
        )));
    }
    log::info!("Analyze '{query}' -> locality '{locality}'");

    blocking(move || {
        let dataset = state.cache.dataset()?;
        let filtered = matching_rows(&dataset, &locality)?;
        let report = LocalityReport::build(&filtered, &locality);
        let table = serde_json::to_value(filtered.table(state.table_limit))
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        Ok(AnalyzeResponse {
            locality,
            query,
            summary: report.summary,
            chart: TrendCharts {
                price_trend: report.price_trend,
                demand_trend: report.demand_trend,
            },
            table,
            count: report.count,
        })
    })
    .await
    .map(Json)
}

pub async fn compare(
    State(state): State<AppState>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<ComparisonResult>, ApiError> {
    let localities: Vec<String> = body(payload)?
        .localities
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if localities.is_empty() {
        return Err(ApiError::BadInput("localities must be a non-empty list".into()));
    }
    if localities.iter().any(|l| l == RANKING_KEY) {
        return Err(ApiError::BadInput(format!(
            "'{RANKING_KEY}' is reserved and cannot be used as a locality"
        )));
    }
    log::info!("Compare {localities:?}");

    blocking(move || {
        let dataset = state.cache.dataset()?;
        Ok(analysis::compare(&dataset, &localities))
    })
    .await
    .map(Json)
}

pub async fn download_csv(
    State(state): State<AppState>,
    payload: Result<Json<LocalityRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let locality = required_locality(payload)?;
    log::info!("CSV download for '{locality}'");

    let disposition = attachment(&locality, "data.csv");
    let bytes = blocking(move || {
        let dataset = state.cache.dataset()?;
        let filtered = matching_rows(&dataset, &locality)?;
        Ok(to_csv(&filtered)?)
    })
    .await?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

pub async fn download_pdf(
    State(state): State<AppState>,
    payload: Result<Json<LocalityRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let locality = required_locality(payload)?;
    log::info!("PDF report for '{locality}'");

    let disposition = attachment(&locality, "report.pdf");
    let bytes = blocking(move || {
        let dataset = state.cache.dataset()?;
        let filtered = matching_rows(&dataset, &locality)?;
        let summary = summarize(&filtered, &locality);
        let trend = build_price_trend(&filtered);
        Ok(render_pdf(&locality, &summary, &trend)?)
    })
    .await?;

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// The price-trend chart alone, as PNG.
pub async fn chart(
    State(state): State<AppState>,
    payload: Result<Json<LocalityRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let locality = required_locality(payload)?;

    let bytes = blocking(move || {
        let dataset = state.cache.dataset()?;
        let filtered = matching_rows(&dataset, &locality)?;
        Ok(render_chart_png(&locality, &build_price_trend(&filtered))?)
    })
    .await?;

    Ok(([(CONTENT_TYPE, "image/png")], bytes).into_response())
}

/// Re-read the dataset file and swap it into the cache.
pub async fn reload(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let cache = state.cache.clone();
    let rows = blocking(move || Ok(cache.reload()?.len())).await?;
    log::info!(
        "Dataset reloaded from {} ({rows} rows)",
        state.cache.path().display()
    );
    Ok(Json(json!({ "status": "reloaded", "rows": rows })))
}

/// Run dataset access and rendering off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("worker task failed: {e}")))?
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadInput(rejection.body_text()))
}

fn required_locality(
    payload: Result<Json<LocalityRequest>, JsonRejection>,
) -> Result<String, ApiError> {
    let locality = body(payload)?.locality.trim().to_string();
    if locality.is_empty() {
        return Err(ApiError::BadInput("locality is required".into()));
    }
    Ok(locality)
}

fn matching_rows(dataset: &Dataset, locality: &str) -> Result<Dataset, ApiError> {
    let filtered = filter_by_locality(dataset, locality);
    if filtered.is_empty() {
        return Err(ApiError::NotFound(format!("no data found for '{locality}'")));
    }
    Ok(filtered)
}

/// `Content-Disposition` for `{locality}_{suffix}`.  Characters that cannot
/// appear in a quoted header value are replaced with `_`.
fn attachment(locality: &str, suffix: &str) -> String {
    let name: String = locality
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{name}_{suffix}\"")
}
