//! # Market News Aggregator
//!
//! Scrapes Indian financial news from several outlets into a deduplicated
//! SQLite store and serves it over HTTP as source-balanced pages, next to
//! normalized market index quotes and on-demand article summaries.
//!
//! ## Usage
//!
//! ```sh
//! market_news_aggregator --config news.yaml
//! ```
//!
//! ## Architecture
//!
//! 1. **Ingestion**: every source adapter runs concurrently on a fixed
//!    interval; results are written idempotently, keyed by URL
//! 2. **Retrieval**: store pages are reshaped round-robin across sources
//! 3. **Quotes**: index symbols are fetched one by one and normalized
//! 4. **Serving**: an axum router under `/api`

use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod balanced;
mod cli;
mod config;
mod error;
mod ingest;
mod models;
mod net;
mod quotes;
mod scheduler;
mod scrapers;
mod server;
mod store;
mod summarizer;
mod utils;

use cli::Cli;
use config::AppConfig;
use ingest::Ingestor;
use net::{BoxError, FetchPage};
use quotes::QuoteService;
use quotes::fetch::YahooChartFetcher;
use server::AppState;
use store::ArticleStore;
use summarizer::TextSummarizer;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("market_news_aggregator starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");
    let config = AppConfig::resolve(&args)?;

    // --- Store ---
    let store = Arc::new(ArticleStore::open(&config.database)?);
    info!(
        path = %config.database.display(),
        articles = store.count()?,
        "Article store ready"
    );

    // --- Ingestion ---
    let fetcher: Arc<dyn FetchPage> = Arc::new(net::default_fetcher()?);
    let adapters = scrapers::default_adapters(fetcher, config.page_delay())?;
    let ingestor = Arc::new(Ingestor::new(
        Arc::clone(&store),
        adapters,
        config.adapter_timeout(),
    ));
    let schedule = scheduler::spawn_periodic(
        ingestor,
        config.scrape_interval(),
        !args.no_initial_scrape,
    );

    // --- HTTP ---
    let quotes = QuoteService::new(
        Arc::new(YahooChartFetcher::new(config.quote_base_url.clone())?),
        config.quote_delay(),
    );
    let summarizer = TextSummarizer::new(config.summary_sentences)?;
    let state = AppState::new(store, quotes, config.quote_symbols.clone(), summarizer);
    let app = server::create_router(state, &config.cors_origin)?;

    let listener = TcpListener::bind(&config.listen).await?;
    info!(addr = %listener.local_addr()?, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    schedule.abort();
    let elapsed = start_time.elapsed();
    info!(secs = elapsed.as_secs(), "market_news_aggregator stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
