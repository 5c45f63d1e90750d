//! Data models for scraped articles, stored rows and market quotes.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: Raw article record as emitted by a source adapter
//! - [`StoredArticle`]: A row of the `articles` table, with store bookkeeping
//! - [`MarketIndex`]: A normalized index quote, built fresh per request
//! - [`ArticleView`] and [`PaginatedResponse`]: JSON shapes served over HTTP
//!
//! The JSON views use camelCase field names to stay compatible with the
//! existing frontend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw news article as scraped from a source.
///
/// Adapters discard records with an empty title before they get here, so the
/// store never sees one.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// The article headline.
    pub title: String,
    /// The absolute article URL. Identity key across the whole store.
    pub url: String,
    /// Human-readable source name, e.g. `"Livemint"`.
    pub source: String,
    /// Body text, usually empty for listing-page scrapes.
    pub content: String,
    /// Teaser or standfirst shown on the listing page.
    pub description: String,
    /// Thumbnail URL, when the listing exposes one.
    pub image_url: Option<String>,
    /// Publication time; ingestion time when the site gives none.
    pub published_at: DateTime<Utc>,
}

impl Article {
    /// Build an article stamped with the current time.
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source: source.into(),
            content: String::new(),
            description: String::new(),
            image_url: None,
            published_at: Utc::now(),
        }
    }
}

/// A row of the `articles` table.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArticle {
    /// Autoincrement row id.
    pub id: i64,
    /// The article headline.
    pub title: String,
    /// Absolute article URL, unique across the table.
    pub url: String,
    /// Source name as recorded at insert time.
    pub source: String,
    /// Body text, empty unless the adapter captured it.
    pub content: String,
    /// Listing teaser, possibly empty.
    pub description: String,
    /// Thumbnail URL, if the listing had one.
    pub image_url: Option<String>,
    /// Publication time. Primary sort key for every read.
    pub published_at: DateTime<Utc>,
    /// Set once, on first successful insert.
    pub created_at: DateTime<Utc>,
    /// Refreshed every time an ingestion run targets this URL.
    pub last_scraped_at: Option<DateTime<Utc>>,
}

/// A market index quote after normalization.
///
/// `change` and `change_percent` are always finite and rounded to two
/// decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketIndex {
    /// Upstream ticker, e.g. `"^NSEI"`.
    pub symbol: String,
    /// Display name, e.g. `"NIFTY 50"`. Falls back to the feed's short name.
    pub name: String,
    /// Last price, live or from the close series.
    pub price: f64,
    /// Absolute move against the previous close.
    pub change: f64,
    /// Percentage move against the previous close; 0 when there is no baseline.
    pub change_percent: f64,
    /// Market time of `price`, or fetch time when the feed omits it.
    pub updated_at: DateTime<Utc>,
    /// True when `price` came from the historical close series.
    pub is_delayed: bool,
}

/// Source name wrapper, serialized as `{"name": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Source name, e.g. `"Groww"`.
    pub name: String,
}

/// Article as served to HTTP clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub url: String,
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none", default)]
    pub image_url: Option<String>,
    pub source: SourceRef,
    pub published_at: DateTime<Utc>,
}

impl From<StoredArticle> for ArticleView {
    fn from(a: StoredArticle) -> Self {
        Self {
            id: a.id,
            title: a.title,
            description: a.description,
            content: a.content,
            url: a.url,
            image_url: a.image_url,
            source: SourceRef { name: a.source },
            published_at: a.published_at,
        }
    }
}

/// One page of articles plus the numbers needed to render a pager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse {
    /// Articles on this page.
    pub articles: Vec<ArticleView>,
    /// Size of the (filtered) result set across all pages.
    pub total_count: usize,
    /// 1-based page number actually served.
    pub current_page: usize,
    /// Effective page size after clamping.
    pub page_size: usize,
    /// `ceil(total_count / page_size)`; 0 for an empty set.
    pub total_pages: usize,
}
