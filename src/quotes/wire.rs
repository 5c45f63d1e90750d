//! Serde model of the v8 chart endpoint response.

use super::RawQuote;
use crate::error::QuoteError;
use serde::Deserialize;

#[derive(Deserialize)]
pub(crate) struct ChartEnvelope {
    pub(crate) chart: Option<ChartNode>,
}

#[derive(Deserialize)]
pub(crate) struct ChartNode {
    pub(crate) result: Option<Vec<ChartResult>>,
    pub(crate) error: Option<ChartError>,
}

#[derive(Deserialize)]
pub(crate) struct ChartError {
    #[serde(default)]
    pub(crate) code: String,
    #[serde(default)]
    pub(crate) description: String,
}

#[derive(Deserialize)]
pub(crate) struct ChartResult {
    #[serde(default)]
    pub(crate) meta: Option<MetaNode>,
    #[serde(default)]
    pub(crate) timestamp: Option<Vec<i64>>,
    #[serde(default)]
    pub(crate) indicators: Option<Indicators>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MetaNode {
    #[serde(default)]
    pub(crate) regular_market_price: Option<f64>,
    #[serde(default)]
    pub(crate) previous_close: Option<f64>,
    #[serde(default)]
    pub(crate) chart_previous_close: Option<f64>,
    #[serde(default)]
    pub(crate) regular_market_time: Option<i64>,
    #[serde(default)]
    pub(crate) short_name: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct Indicators {
    #[serde(default)]
    pub(crate) quote: Vec<QuoteBlock>,
}

#[derive(Deserialize)]
pub(crate) struct QuoteBlock {
    #[serde(default)]
    pub(crate) close: Vec<Option<f64>>,
}

impl ChartEnvelope {
    /// Unwrap the first chart result, turning upstream error payloads and
    /// empty results into per-symbol errors.
    pub(crate) fn into_raw(self, symbol: &str) -> Result<RawQuote, QuoteError> {
        let node = self
            .chart
            .ok_or_else(|| QuoteError::EmptyResult(symbol.to_string()))?;

        if let Some(err) = node.error {
            return Err(QuoteError::Upstream {
                code: err.code,
                description: err.description,
            });
        }

        let result = node
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| QuoteError::EmptyResult(symbol.to_string()))?;

        let meta = result.meta.unwrap_or_default();
        let closes = result
            .indicators
            .and_then(|i| i.quote.into_iter().next())
            .map(|q| q.close)
            .unwrap_or_default();

        Ok(RawQuote {
            regular_market_price: meta.regular_market_price,
            previous_close: meta.previous_close,
            chart_previous_close: meta.chart_previous_close,
            regular_market_time: meta.regular_market_time,
            short_name: meta.short_name,
            timestamps: result.timestamp.unwrap_or_default(),
            closes,
        })
    }
}
