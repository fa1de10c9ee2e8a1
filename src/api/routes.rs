//! Query API routes

use super::error::ApiError;
use crate::query::{CurrentPrice, HistoricalPage, PriceStatistics, QueryError, QueryService};
use crate::time_format;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shared state for the query API handlers
#[derive(Clone)]
pub struct ApiState {
    pub service: QueryService,
    /// Page size used when a request omits `per_page`
    pub default_per_page: u64,
}

impl ApiState {
    pub fn new(service: QueryService, default_per_page: u64) -> Self {
        Self {
            service,
            default_per_page,
        }
    }
}

/// Build the query API router
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/current_price", get(current_price))
        .route("/historical_data", get(historical_data))
        .route("/statistical_analysis", get(statistical_analysis))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SymbolParams {
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    symbol: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    page: Option<String>,
    per_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatsParams {
    symbol: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn current_price(
    State(state): State<ApiState>,
    Query(params): Query<SymbolParams>,
) -> Result<Json<CurrentPrice>, ApiError> {
    let symbol = single_symbol(params.symbol.as_deref())?;
    let service = state.service.clone();

    let price = run_blocking(move || service.current_price(&symbol)).await?;
    Ok(Json(price))
}

async fn historical_data(
    State(state): State<ApiState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoricalPage>, ApiError> {
    let (Some(symbol), Some(start), Some(end)) = (
        non_blank(params.symbol.as_deref()),
        non_blank(params.start_date.as_deref()),
        non_blank(params.end_date.as_deref()),
    ) else {
        return Err(ApiError::BadRequest(
            "Please provide symbol, start_date, and end_date parameters".into(),
        ));
    };

    let symbol = single_symbol(Some(symbol))?;
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    let page = parse_positive(params.page.as_deref(), 1)?;
    let per_page = parse_positive(params.per_page.as_deref(), state.default_per_page)?;

    let service = state.service.clone();
    let history =
        run_blocking(move || service.historical_range(&symbol, start, end, page, per_page))
            .await?;
    Ok(Json(history))
}

async fn statistical_analysis(
    State(state): State<ApiState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<PriceStatistics>, ApiError> {
    let symbol = single_symbol(params.symbol.as_deref())?;

    // A window needs both bounds; a lone bound is ignored
    let (start, end) = match (
        non_blank(params.start_date.as_deref()),
        non_blank(params.end_date.as_deref()),
    ) {
        (Some(start), Some(end)) => (Some(parse_date(start)?), Some(parse_date(end)?)),
        _ => (None, None),
    };

    let service = state.service.clone();
    let stats = run_blocking(move || service.statistical_analysis(&symbol, start, end)).await?;
    Ok(Json(stats))
}

/// Run a query on the blocking pool
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, QueryError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn single_symbol(raw: Option<&str>) -> Result<String, ApiError> {
    let raw = non_blank(raw)
        .ok_or_else(|| ApiError::BadRequest("Please provide a valid symbol parameter".into()))?;

    if raw.contains(',') {
        return Err(ApiError::BadRequest(
            "Only one symbol parameter is allowed".into(),
        ));
    }

    Ok(raw.trim().to_string())
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    time_format::parse(raw.trim()).map_err(|_| {
        ApiError::BadRequest(
            "Invalid date format, date format must be YYYY-MM-DD HH:MM:SS".into(),
        )
    })
}

fn parse_positive(raw: Option<&str>, default: u64) -> Result<u64, ApiError> {
    let invalid = || ApiError::BadRequest("page and per_page must be positive integers".into());

    match non_blank(raw) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(invalid()),
        },
    }
}
