//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over the network boundary so the pipeline
//! can run against the real Nasdaq endpoint or a scripted provider in tests.

use crate::domain::{RawPayload, TickerRequest, TickerStats};
use thiserror::Error;

/// Per-ticker failures. None of these abort a batch; the ticker is skipped.
///
/// The messages double as operator diagnostics, so each branch reads
/// differently ("no data", "wrong format", "delisted ticker").
#[derive(Debug, Error)]
pub enum DataError {
    #[error("the server could not be reached or the ticker doesn't exist: {0}")]
    NetworkUnreachable(String),

    #[error("the data was not compressed with gzip or could not be decompressed: {0}")]
    NotGzip(String),

    #[error("the data is not valid JSON or there is no data: {0}")]
    InvalidJson(String),

    #[error("ticker does not exist (provider status {code}){}", fmt_reason(.message))]
    TickerNotFound { code: i64, message: Option<String> },

    #[error("unparseable price point at index {index}: {reason}")]
    UnparseablePoint { index: usize, reason: String },

    #[error("no price data for {symbol}")]
    EmptySeries { symbol: String },
}

fn fmt_reason(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {m}"),
        None => String::new(),
    }
}

/// Coarse classification of a [`DataError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Decode,
    EmptySeries,
}

impl DataError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NetworkUnreachable(_) => FailureKind::Transport,
            Self::NotGzip(_)
            | Self::InvalidJson(_)
            | Self::TickerNotFound { .. }
            | Self::UnparseablePoint { .. } => FailureKind::Decode,
            Self::EmptySeries { .. } => FailureKind::EmptySeries,
        }
    }
}

/// Trait for chart providers.
///
/// One call per ticker, no retries. Implementations return the body exactly
/// as received; decompression is the decoder's job.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the raw chart payload for a ticker over its lookback window.
    fn fetch(&self, request: &TickerRequest) -> Result<RawPayload, DataError>;
}

/// Progress callback for multi-ticker runs.
///
/// There is no total: in interactive mode tickers arrive one prompt at a time.
pub trait BatchProgress {
    /// Called when starting to process a ticker.
    fn on_start(&self, symbol: &str, index: usize);

    /// Called when a ticker completes, successfully or not.
    fn on_complete(&self, symbol: &str, index: usize, result: &Result<TickerStats, DataError>);

    /// Called when the ticker source is exhausted.
    fn on_batch_complete(&self, succeeded: usize, failed: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl BatchProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize) {
        println!("[{}] Fetching {symbol}...", index + 1);
    }

    fn on_complete(&self, symbol: &str, _index: usize, result: &Result<TickerStats, DataError>) {
        match result {
            Ok(stats) => println!(
                "  {}: min {:.2}  max {:.2}  avg {:.2}  median {:.2}",
                stats.ticker, stats.min, stats.max, stats.avg, stats.median
            ),
            Err(e) => println!("  FAIL: {symbol}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize) {
        let total = succeeded + failed;
        println!("\nDone: {succeeded}/{total} succeeded, {failed} failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            DataError::NetworkUnreachable("timeout".into()).kind(),
            FailureKind::Transport
        );
        assert_eq!(
            DataError::TickerNotFound {
                code: 400,
                message: None
            }
            .kind(),
            FailureKind::Decode
        );
        assert_eq!(
            DataError::EmptySeries {
                symbol: "MSFT".into()
            }
            .kind(),
            FailureKind::EmptySeries
        );
    }

    #[test]
    fn diagnostics_are_distinct() {
        let no_data = DataError::InvalidJson("data is null".into()).to_string();
        let wrong_format = DataError::NotGzip("invalid gzip header".into()).to_string();
        let delisted = DataError::TickerNotFound {
            code: 400,
            message: Some("Symbol not exists".into()),
        }
        .to_string();

        assert_ne!(no_data, wrong_format);
        assert_ne!(wrong_format, delisted);
        assert!(delisted.ends_with("(provider status 400): Symbol not exists"));
    }
}
