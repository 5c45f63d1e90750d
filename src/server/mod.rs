//! HTTP read surface.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/api/news` | [`handlers::legacy_news`] |
//! | GET | `/api/news/db` | [`handlers::balanced_news`] |
//! | GET | `/api/market-indices` | [`handlers::market_indices`] |
//! | POST | `/api/summarize` | [`handlers::summarize`] |
//! | GET | `/api/health` | [`handlers::health`] |

pub mod handlers;

use crate::balanced::BalancedRetrieval;
use crate::quotes::QuoteService;
use crate::store::ArticleStore;
use crate::summarizer::TextSummarizer;
use axum::{
    Router,
    http::{
        HeaderName, HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ORIGIN},
        header::InvalidHeaderValue,
    },
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state. Cloned per request, so everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Article store, read by the news endpoints.
    pub store: Arc<ArticleStore>,
    /// Source-balanced view over `store`.
    pub balanced: BalancedRetrieval,
    /// Upstream index quotes.
    pub quotes: Arc<QuoteService>,
    /// Symbols served by `/api/market-indices`, in display order.
    pub quote_symbols: Arc<Vec<String>>,
    /// Summarizer behind `/api/summarize`.
    pub summarizer: Arc<TextSummarizer>,
}

impl AppState {
    pub fn new(
        store: Arc<ArticleStore>,
        quotes: QuoteService,
        quote_symbols: Vec<String>,
        summarizer: TextSummarizer,
    ) -> Self {
        Self {
            balanced: BalancedRetrieval::new(Arc::clone(&store)),
            store,
            quotes: Arc::new(quotes),
            quote_symbols: Arc::new(quote_symbols),
            summarizer: Arc::new(summarizer),
        }
    }
}

/// CORS for a single browser origin, with credentials.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    let origin: HeaderValue = origin.parse()?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            ORIGIN,
            CONTENT_TYPE,
            ACCEPT,
            AUTHORIZATION,
            CACHE_CONTROL,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(Duration::from_secs(12 * 60 * 60)))
}

pub fn create_router(state: AppState, cors_origin: &str) -> Result<Router, InvalidHeaderValue> {
    let api_routes = Router::new()
        .route("/news", get(handlers::legacy_news))
        .route("/news/db", get(handlers::balanced_news))
        .route("/market-indices", get(handlers::market_indices))
        .route("/summarize", post(handlers::summarize))
        .route("/health", get(handlers::health));

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(cors_layer(cors_origin)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
