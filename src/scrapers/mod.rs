//! News source adapters.
//!
//! Each adapter is an independent black box: given its site, it returns zero
//! or more [`Article`]s or fails. Adapters share no state, and each owns its
//! own pagination, politeness delay and retry policy.
//!
//! # Supported Sources
//!
//! | Source | Listing | Pages | Notes |
//! |--------|---------|-------|-------|
//! | Livemint | stock-market-news | 5 | |
//! | Economic Times | markets/stocks/news | 5 | |
//! | MoneyControl | markets + stocks sections | 5 each | URL must mention markets/stocks |
//! | Groww | market-news/stocks | 1 | |
//! | Business Standard | markets/news | 1 | |
//! | India Today | business/market | 1 | title or URL must be market-related |
//!
//! All of them are [`listing::ListingScraper`]s configured by a
//! [`listing::SiteProfile`] from [`sites`].

pub mod listing;
pub mod sites;

use crate::models::Article;
use crate::net::{BoxError, FetchPage};
use async_trait::async_trait;
use listing::ListingScraper;
use std::sync::Arc;
use std::time::Duration;

/// One news source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Human-readable source name, also stored on every article.
    fn name(&self) -> &str;

    /// Scrape the source. Records with an empty title never make it out.
    async fn scrape(&self) -> Result<Vec<Article>, BoxError>;
}

/// Build one adapter per supported outlet, sharing a single fetcher.
pub fn default_adapters(
    fetcher: Arc<dyn FetchPage>,
    page_delay: Duration,
) -> Result<Vec<Arc<dyn SourceAdapter>>, BoxError> {
    sites::all()
        .into_iter()
        .map(|profile| {
            let scraper = ListingScraper::new(profile, Arc::clone(&fetcher), page_delay)?;
            Ok(Arc::new(scraper) as Arc<dyn SourceAdapter>)
        })
        .collect()
}
