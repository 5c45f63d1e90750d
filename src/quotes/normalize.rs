//! Turn a noisy [`RawQuote`] into a [`MarketIndex`].
//!
//! The output never carries NaN or infinity. Resolution order:
//!
//! 1. Price: live `regularMarketPrice`, else the most recent usable close of
//!    the historical series (marks the quote as delayed).
//! 2. Baseline: `previousClose`, else `chartPreviousClose`; when the price
//!    came from history, the close before it wins if there is one.
//! 3. Time: `regularMarketTime`, else the last series timestamp, else now.
//!
//! A price that is still zero after fallbacks fails the symbol.

use super::RawQuote;
use crate::error::QuoteError;
use crate::models::MarketIndex;
use chrono::{DateTime, Utc};

/// Baselines closer to zero than this produce a 0% change instead of a division.
const MIN_BASELINE: f64 = 1e-6;

/// Normalize a raw quote, stamping it with the current time if the feed has none.
///
/// # Arguments
///
/// * `symbol` - Ticker the quote was fetched for
/// * `raw` - Quote fields as delivered upstream
///
/// # Returns
///
/// A [`MarketIndex`] with finite, rounded `change` and `change_percent`.
///
/// # Errors
///
/// [`QuoteError::NoPrice`] when no usable price can be found.
pub fn normalize(symbol: &str, raw: &RawQuote) -> Result<MarketIndex, QuoteError> {
    normalize_at(symbol, raw, Utc::now())
}

/// Same as [`normalize`] with an explicit "now".
pub fn normalize_at(
    symbol: &str,
    raw: &RawQuote,
    now: DateTime<Utc>,
) -> Result<MarketIndex, QuoteError> {
    let mut price = finite(raw.regular_market_price).unwrap_or(0.0);
    let mut previous_close = finite(raw.previous_close)
        .or(finite(raw.chart_previous_close))
        .unwrap_or(0.0);
    let mut is_delayed = false;

    if price == 0.0 {
        if let Some((idx, close)) = last_usable_close(&raw.closes, raw.closes.len()) {
            price = close;
            is_delayed = true;
            if let Some((_, prev)) = last_usable_close(&raw.closes, idx) {
                previous_close = prev;
            }
        }
    }

    if price == 0.0 {
        return Err(QuoteError::NoPrice(symbol.to_string()));
    }

    let (change, change_percent) = calculate_change(price, previous_close);

    let updated_at = raw
        .regular_market_time
        .filter(|t| *t > 0)
        .and_then(|t| DateTime::from_timestamp(t, 0))
        .or_else(|| {
            raw.timestamps
                .last()
                .and_then(|t| DateTime::from_timestamp(*t, 0))
        })
        .unwrap_or(now);

    Ok(MarketIndex {
        symbol: symbol.to_string(),
        name: index_name(symbol, raw.short_name.as_deref()),
        price,
        change,
        change_percent,
        updated_at,
        is_delayed,
    })
}

/// Absolute and percent change, both finite and rounded to 2 dp.
pub fn calculate_change(price: f64, previous_close: f64) -> (f64, f64) {
    if !price.is_finite() || !previous_close.is_finite() {
        return (0.0, 0.0);
    }

    let change = price - previous_close;
    let change_percent = if previous_close.abs() < MIN_BASELINE {
        0.0
    } else {
        change / previous_close * 100.0
    };

    (round2(change), round2(change_percent))
}

/// Round half away from zero to 2 dp.
///
/// Operates on the binary value, so `1.005` (stored as `1.00499999…`) gives `1.0`.
pub fn round2(x: f64) -> f64 {
    let r = (x * 100.0).round() / 100.0;
    if r.is_finite() { r } else { 0.0 }
}

/// Display name for an index symbol.
pub fn index_name(symbol: &str, short_name: Option<&str>) -> String {
    match symbol {
        "^NSEI" => "NIFTY 50".to_string(),
        "^BSESN" => "BSE SENSEX".to_string(),
        _ => short_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(symbol)
            .to_string(),
    }
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Most recent finite, non-zero close in `closes[..end]`.
fn last_usable_close(closes: &[Option<f64>], end: usize) -> Option<(usize, f64)> {
    closes[..end.min(closes.len())]
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, c)| finite(*c).filter(|v| *v != 0.0).map(|v| (i, v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_live_price_with_previous_close() {
        let raw = RawQuote {
            regular_market_price: Some(22500.0),
            previous_close: Some(22000.0),
            regular_market_time: Some(1_746_500_000),
            ..Default::default()
        };
        let idx = normalize_at("^NSEI", &raw, now()).unwrap();
        assert_eq!(idx.price, 22500.0);
        assert_eq!(idx.change, 500.0);
        assert_eq!(idx.change_percent, 2.27);
        assert!(!idx.is_delayed);
        assert_eq!(idx.name, "NIFTY 50");
        assert_eq!(idx.updated_at.timestamp(), 1_746_500_000);
    }

    #[test]
    fn test_falls_back_to_history_when_live_price_missing() {
        let raw = RawQuote {
            regular_market_price: Some(0.0),
            closes: vec![Some(100.0), Some(105.0)],
            ..Default::default()
        };
        let idx = normalize_at("^BSESN", &raw, now()).unwrap();
        assert_eq!(idx.price, 105.0);
        assert_eq!(idx.change, 5.0);
        assert_eq!(idx.change_percent, 5.0);
        assert!(idx.is_delayed);
    }

    #[test]
    fn test_history_baseline_overrides_previous_close() {
        let raw = RawQuote {
            regular_market_price: Some(f64::NAN),
            previous_close: Some(90.0),
            closes: vec![Some(100.0), Some(105.0)],
            ..Default::default()
        };
        let idx = normalize_at("X", &raw, now()).unwrap();
        assert_eq!(idx.price, 105.0);
        assert_eq!(idx.change, 5.0);
    }

    #[test]
    fn test_single_history_point_keeps_previous_close() {
        let raw = RawQuote {
            regular_market_price: Some(f64::INFINITY),
            previous_close: Some(100.0),
            closes: vec![Some(110.0)],
            ..Default::default()
        };
        let idx = normalize_at("X", &raw, now()).unwrap();
        assert_eq!(idx.price, 110.0);
        assert_eq!(idx.change, 10.0);
        assert!(idx.is_delayed);
    }

    #[test]
    fn test_history_skips_null_tail() {
        let raw = RawQuote {
            closes: vec![Some(100.0), Some(104.0), None],
            ..Default::default()
        };
        let idx = normalize_at("X", &raw, now()).unwrap();
        assert_eq!(idx.price, 104.0);
        assert_eq!(idx.change, 4.0);
    }

    #[test]
    fn test_chart_previous_close_used_when_previous_close_absent() {
        let raw = RawQuote {
            regular_market_price: Some(102.0),
            chart_previous_close: Some(100.0),
            ..Default::default()
        };
        let idx = normalize_at("X", &raw, now()).unwrap();
        assert_eq!(idx.change, 2.0);
        assert_eq!(idx.change_percent, 2.0);
    }

    #[test]
    fn test_zero_price_after_fallbacks_is_error() {
        let raw = RawQuote {
            regular_market_price: Some(0.0),
            closes: vec![None, Some(f64::NAN)],
            ..Default::default()
        };
        assert!(matches!(
            normalize_at("^NSEI", &raw, now()),
            Err(QuoteError::NoPrice(_))
        ));
    }

    #[test]
    fn test_near_zero_baseline_forces_zero_percent() {
        let (change, pct) = calculate_change(100.0, 0.0000001);
        assert_eq!(pct, 0.0);
        assert_eq!(change, 100.0);
    }

    #[test]
    fn test_missing_baseline_yields_finite_output() {
        let raw = RawQuote {
            regular_market_price: Some(250.0),
            ..Default::default()
        };
        let idx = normalize_at("X", &raw, now()).unwrap();
        assert!(idx.change.is_finite());
        assert_eq!(idx.change_percent, 0.0);
    }

    #[test]
    fn test_rounding_is_on_the_binary_difference() {
        // 101.005 - 100 is 1.00499999... in binary
        let (change, pct) = calculate_change(101.005, 100.0);
        assert_eq!(change, 1.0);
        assert_eq!(pct, 1.0);
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(2.5 / 100.0 * 100.0), 2.5);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(f64::MAX), 0.0);
    }

    #[test]
    fn test_non_finite_inputs_give_zero_change() {
        assert_eq!(calculate_change(f64::NAN, 100.0), (0.0, 0.0));
        assert_eq!(calculate_change(100.0, f64::NEG_INFINITY), (0.0, 0.0));
    }

    #[test]
    fn test_timestamp_resolution_order() {
        let mut raw = RawQuote {
            regular_market_price: Some(10.0),
            regular_market_time: Some(0),
            timestamps: vec![1_746_403_200, 1_746_489_600],
            ..Default::default()
        };
        let idx = normalize_at("X", &raw, now()).unwrap();
        assert_eq!(idx.updated_at.timestamp(), 1_746_489_600);

        raw.timestamps.clear();
        let idx = normalize_at("X", &raw, now()).unwrap();
        assert_eq!(idx.updated_at, now());
    }

    #[test]
    fn test_index_name() {
        assert_eq!(index_name("^BSESN", None), "BSE SENSEX");
        assert_eq!(index_name("^NSEBANK", Some("NIFTY BANK")), "NIFTY BANK");
        assert_eq!(index_name("^NSEBANK", Some("  ")), "^NSEBANK");
    }
}
