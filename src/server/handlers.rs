use super::AppState;
use crate::error::{ApiError, StoreError};
use crate::models::{ArticleView, MarketIndex, PaginatedResponse};
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, instrument, warn};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 50;
/// Rows loaded by the legacy endpoint, which pages in memory.
const LEGACY_LIMIT: usize = 1000;

/// Raw paging parameters. Values are kept as strings so junk input degrades
/// to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
    search: Option<String>,
}

impl PageParams {
    /// `(page, page_size)` after clamping: page ≥ 1, page size in 1..=50,
    /// with a missing or invalid page size meaning 10.
    pub fn resolve(&self) -> (usize, usize) {
        let page = lenient(self.page.as_deref(), 1).max(1) as usize;
        let page_size = match lenient(self.page_size.as_deref(), DEFAULT_PAGE_SIZE as i64) {
            n if n < 1 => DEFAULT_PAGE_SIZE,
            n => (n as usize).min(MAX_PAGE_SIZE),
        };
        (page, page_size)
    }

    fn search(&self) -> &str {
        self.search.as_deref().unwrap_or_default()
    }
}

/// Absent means `default`; present but unparsable means 0.
fn lenient(value: Option<&str>, default: i64) -> i64 {
    match value {
        None => default,
        Some(v) => v.trim().parse().unwrap_or(0),
    }
}

fn total_pages(total_count: usize, page_size: usize) -> usize {
    total_count.div_ceil(page_size)
}

/// `GET /api/news`: most recent rows, paged in memory, no balancing.
///
/// A page past the end is clamped to the last page.
#[instrument(level = "info", skip(state))]
pub async fn legacy_news(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse>, ApiError> {
    let (page, page_size) = params.resolve();

    let store = Arc::clone(&state.store);
    let (rows, _) = tokio::task::spawn_blocking(move || store.query(1, LEGACY_LIMIT, ""))
        .await
        .map_err(StoreError::from)??;

    let total_count = rows.len();
    let total_pages = total_pages(total_count, page_size);
    let current_page = page.min(total_pages).max(1);

    let articles = rows
        .into_iter()
        .skip((current_page - 1) * page_size)
        .take(page_size)
        .map(ArticleView::from)
        .collect();

    Ok(Json(PaginatedResponse {
        articles,
        total_count,
        current_page,
        page_size,
        total_pages,
    }))
}

/// `GET /api/news/db`: source-balanced page straight from the store.
#[instrument(level = "info", skip(state))]
pub async fn balanced_news(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse>, ApiError> {
    let (page, page_size) = params.resolve();

    let (rows, total_count) = state
        .balanced
        .page(page, page_size, params.search())
        .await
        .inspect_err(|e| error!(error = %e, "Error querying news"))?;

    Ok(Json(PaginatedResponse {
        articles: rows.into_iter().map(ArticleView::from).collect(),
        total_count,
        current_page: page,
        page_size,
        total_pages: total_pages(total_count, page_size),
    }))
}

/// `GET /api/market-indices`
#[instrument(level = "info", skip_all)]
pub async fn market_indices(State(state): State<AppState>) -> Result<Json<Vec<MarketIndex>>, ApiError> {
    match state.quotes.fetch_all(&state.quote_symbols).await {
        Err(e) => {
            error!(error = %e, "Error fetching market indices");
            Err(ApiError::Internal {
                message: "Failed to fetch market indices".into(),
                details: Some(e.to_string()),
            })
        }
        Ok(indices) if indices.is_empty() => {
            warn!("No market indices data received");
            Err(ApiError::NotFound("No market data available".into()))
        }
        Ok(indices) => Ok(Json(indices)),
    }
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// `POST /api/summarize`
#[instrument(level = "info", skip_all)]
pub async fn summarize(
    State(state): State<AppState>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let url = match payload {
        Ok(Json(req)) if !req.url.trim().is_empty() => req.url,
        Ok(_) => return Err(ApiError::BadRequest("Invalid request body".into())),
        Err(rejection) => {
            warn!(error = %rejection, "Rejected summarize request");
            return Err(ApiError::BadRequest("Invalid request body".into()));
        }
    };

    let summary = state.summarizer.summarize_url(url.trim()).await.map_err(|e| {
        error!(%url, error = %e, "Summarization failed");
        ApiError::internal(e)
    })?;

    Ok(Json(SummarizeResponse { summary }))
}

/// `GET /api/health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
