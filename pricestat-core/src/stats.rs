//! Closing-price summary statistics.

use crate::data::DataError;
use crate::domain::{PriceSeries, TickerStats};

/// Reduce a series to min, max, mean and median, tagged with `ticker`.
///
/// An empty series fails before any statistic is computed. Values are sorted
/// with `f64::total_cmp`, so min and max are the ends of the sorted sequence.
pub fn aggregate(series: &PriceSeries, ticker: &str) -> Result<TickerStats, DataError> {
    if series.is_empty() {
        return Err(DataError::EmptySeries {
            symbol: ticker.to_string(),
        });
    }

    let mut closes: Vec<f64> = series.closes().collect();
    closes.sort_by(f64::total_cmp);

    let n = closes.len();
    let (min, max) = (closes[0], closes[n - 1]);

    Ok(TickerStats {
        min,
        max,
        avg: mean(&closes).max(min).min(max),
        median: median_of_sorted(&closes),
        ticker: ticker.to_string(),
    })
}

/// Arithmetic mean of a non-empty slice.
///
/// Falls back to summing pre-divided terms when the plain sum overflows, so
/// finite inputs always give a finite mean.
fn mean(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    if sum.is_finite() {
        sum / n
    } else {
        values.iter().map(|v| v / n).sum()
    }
}

/// Median of an already sorted, non-empty slice.
fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        // Halve first: `a + b` overflows near f64::MAX.
        sorted[n / 2 - 1] / 2.0 + sorted[n / 2] / 2.0
    }
}
