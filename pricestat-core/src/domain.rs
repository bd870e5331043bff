//! Domain types shared by every pipeline stage.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// A normalized ticker plus the lookback window it is queried over.
///
/// The window is `[end - lookback_years, end]`. When `end` is Feb 29 and the
/// start year is not a leap year the start clamps to Feb 28.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRequest {
    symbol: String,
    start: NaiveDate,
    end: NaiveDate,
}

impl TickerRequest {
    pub fn new(ticker: &str, end: NaiveDate, lookback_years: u32) -> Self {
        let start = end
            .checked_sub_months(Months::new(lookback_years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        Self {
            symbol: ticker.trim().to_uppercase(),
            start,
            end,
        }
    }

    /// Request anchored to the current local date.
    pub fn for_today(ticker: &str, lookback_years: u32) -> Self {
        Self::new(ticker, chrono::Local::now().date_naive(), lookback_years)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Undecoded response body, still gzip-compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload(Vec<u8>);

impl RawPayload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One daily observation from the provider chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    /// Closing price.
    pub close: f64,
    /// Epoch milliseconds, when the provider sent one.
    pub timestamp_ms: Option<i64>,
}

impl PricePoint {
    pub fn new(close: f64) -> Self {
        Self {
            close,
            timestamp_ms: None,
        }
    }
}

/// Price points for one ticker, in provider order (not necessarily sorted).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries(Vec<PricePoint>);

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.0
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|p| p.close)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for PriceSeries {
    fn from(closes: Vec<f64>) -> Self {
        Self(closes.into_iter().map(PricePoint::new).collect())
    }
}

impl FromIterator<PricePoint> for PriceSeries {
    fn from_iter<I: IntoIterator<Item = PricePoint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Summary statistics of one ticker's closing prices.
///
/// Field order is the persisted JSON key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub median: f64,
    pub ticker: String,
}

/// Successful results of a run, in request order. Failed tickers are absent.
pub type StatsBatch = Vec<TickerStats>;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn request_normalizes_symbol() {
        let req = TickerRequest::new("  msft ", date(2025, 3, 14), 5);
        assert_eq!(req.symbol(), "MSFT");
    }

    #[test]
    fn request_spans_five_years() {
        let req = TickerRequest::new("AAPL", date(2025, 3, 14), 5);
        assert_eq!(req.start(), date(2020, 3, 14));
        assert_eq!(req.end(), date(2025, 3, 14));
    }

    #[test]
    fn leap_day_start_clamps_to_feb_28() {
        let req = TickerRequest::new("AAPL", date(2024, 2, 29), 5);
        assert_eq!(req.start(), date(2019, 2, 28));
    }

    #[test]
    fn stats_serialize_in_persisted_key_order() {
        let stats = TickerStats {
            min: 10.0,
            max: 30.0,
            avg: 20.0,
            median: 20.0,
            ticker: "MSFT".into(),
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(
            json,
            r#"{"min":10.0,"max":30.0,"avg":20.0,"median":20.0,"ticker":"MSFT"}"#
        );
    }

    #[test]
    fn series_from_closes_keeps_order() {
        let series = PriceSeries::from(vec![3.0, 1.0, 2.0]);
        assert_eq!(series.closes().collect::<Vec<_>>(), vec![3.0, 1.0, 2.0]);
        assert!(series.points().iter().all(|p| p.timestamp_ms.is_none()));
    }
}
