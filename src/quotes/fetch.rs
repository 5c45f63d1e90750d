//! Raw quote retrieval from the v8 chart endpoint.

use super::RawQuote;
use super::wire::ChartEnvelope;
use crate::error::QuoteError;
use crate::net::USER_AGENT;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, REFERER};
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Source of raw, un-normalized quotes for one symbol.
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    async fn fetch_raw(&self, symbol: &str) -> Result<RawQuote, QuoteError>;
}

/// Fetches daily chart data (`interval=1d&range=2d`) so a historical close is
/// available when the live price is missing.
#[derive(Debug, Clone)]
pub struct YahooChartFetcher {
    client: Client,
    base_url: String,
}

impl YahooChartFetcher {
    pub fn new(base_url: impl Into<String>) -> Result<Self, QuoteError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}?interval=1d&range=2d",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(symbol)
        )
    }
}

#[async_trait]
impl QuoteFetcher for YahooChartFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_raw(&self, symbol: &str) -> Result<RawQuote, QuoteError> {
        let resp = self
            .client
            .get(self.chart_url(symbol))
            .header(ACCEPT, "application/json")
            .header(REFERER, "https://finance.yahoo.com")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(QuoteError::Status {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }

        let body = resp.text().await?;
        debug!(bytes = body.len(), "chart response received");
        let envelope: ChartEnvelope = serde_json::from_str(&body)?;
        envelope.into_raw(symbol)
    }
}
