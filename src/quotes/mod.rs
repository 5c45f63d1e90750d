//! Market index quotes.
//!
//! [`fetch`] pulls raw chart data per symbol, [`normalize`] turns it into a
//! finite [`MarketIndex`], and [`QuoteService`] walks the configured symbols
//! one at a time.

pub mod fetch;
pub mod normalize;
mod wire;

use crate::error::QuoteError;
use crate::models::MarketIndex;
use fetch::QuoteFetcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Upstream quote fields as delivered, before any fallback is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQuote {
    /// Live price, if the feed reported one.
    pub regular_market_price: Option<f64>,
    /// Preferred change baseline.
    pub previous_close: Option<f64>,
    /// Baseline used when `previous_close` is missing.
    pub chart_previous_close: Option<f64>,
    /// Unix seconds.
    pub regular_market_time: Option<i64>,
    /// Feed's own display name, used for unknown symbols.
    pub short_name: Option<String>,
    /// Unix seconds, parallel to `closes`.
    pub timestamps: Vec<i64>,
    /// Historical closes; gaps are `None`.
    pub closes: Vec<Option<f64>>,
}

/// Fetches index quotes one symbol at a time and normalizes them.
///
/// Holds no cache; every call goes upstream.
pub struct QuoteService {
    /// Upstream source of raw quotes.
    fetcher: Arc<dyn QuoteFetcher>,
    /// Pause between consecutive symbols.
    delay: Duration,
}

impl QuoteService {
    /// `delay` is slept between consecutive symbols, not before the first.
    pub fn new(fetcher: Arc<dyn QuoteFetcher>, delay: Duration) -> Self {
        Self { fetcher, delay }
    }

    /// Fetch and normalize every symbol in order.
    ///
    /// Failing symbols are logged and left out.
    ///
    /// # Arguments
    ///
    /// * `symbols` - Upstream tickers, fetched in the given order
    ///
    /// # Returns
    ///
    /// The indices that normalized successfully, in symbol order. Empty when
    /// `symbols` is empty.
    ///
    /// # Errors
    ///
    /// [`QuoteError::NoData`] when symbols were requested and none worked.
    #[instrument(level = "info", skip_all, fields(symbols = symbols.len()))]
    pub async fn fetch_all(&self, symbols: &[String]) -> Result<Vec<MarketIndex>, QuoteError> {
        let mut indices = Vec::with_capacity(symbols.len());

        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                sleep(self.delay).await;
            }

            match self.fetch_one(symbol).await {
                Ok(index) => indices.push(index),
                Err(e) => warn!(symbol = %symbol, error = %e, "Skipping market index"),
            }
        }

        if !symbols.is_empty() && indices.is_empty() {
            return Err(QuoteError::NoData);
        }

        info!(fetched = indices.len(), "Market indices fetched");
        Ok(indices)
    }

    async fn fetch_one(&self, symbol: &str) -> Result<MarketIndex, QuoteError> {
        let raw = self.fetcher.fetch_raw(symbol).await?;
        normalize::normalize(symbol, &raw)
    }
}
