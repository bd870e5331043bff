//! Batch orchestrator — runs fetch → decode → aggregate for each ticker in order.

use super::decode::decode;
use super::provider::{BatchProgress, DataError, PriceProvider};
use crate::domain::{StatsBatch, TickerRequest, TickerStats};
use crate::stats::aggregate;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// Sequential per-ticker pipeline over a provider.
pub struct StatsPipeline<'a> {
    provider: &'a dyn PriceProvider,
    lookback_years: u32,
    anchor: Option<NaiveDate>,
}

impl<'a> StatsPipeline<'a> {
    pub fn new(provider: &'a dyn PriceProvider, lookback_years: u32) -> Self {
        Self {
            provider,
            lookback_years,
            anchor: None,
        }
    }

    /// Pin the end of the lookback window instead of using today's date.
    pub fn with_anchor_date(mut self, date: NaiveDate) -> Self {
        self.anchor = Some(date);
        self
    }

    pub fn request_for(&self, ticker: &str) -> TickerRequest {
        match self.anchor {
            Some(date) => TickerRequest::new(ticker, date, self.lookback_years),
            None => TickerRequest::for_today(ticker, self.lookback_years),
        }
    }

    /// Process a single ticker: fetch → decode → aggregate.
    ///
    /// The stats are tagged with the provider-confirmed symbol when the
    /// envelope carries one, otherwise with the normalized request symbol.
    pub fn process(&self, ticker: &str) -> Result<TickerStats, DataError> {
        let request = self.request_for(ticker);
        let payload = self.provider.fetch(&request)?;
        let chart = decode(&payload)?;
        let symbol = match chart.confirmed_symbol.as_deref() {
            Some(confirmed) if confirmed != request.symbol() => {
                warn!(
                    requested = request.symbol(),
                    confirmed, "provider confirmed a different symbol"
                );
                confirmed
            }
            Some(confirmed) => {
                debug!(symbol = confirmed, "provider confirmed symbol");
                confirmed
            }
            None => request.symbol(),
        };
        aggregate(&chart.series, symbol)
    }

    /// Process every ticker from `tickers`, one at a time, in order.
    ///
    /// Failures are logged, reported to `progress`, and left out of the batch;
    /// they never stop later tickers. Blank entries are skipped.
    pub fn run<I>(&self, tickers: I, progress: &dyn BatchProgress) -> BatchSummary
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut stats = StatsBatch::new();
        let mut errors: Vec<(String, DataError)> = Vec::new();
        let mut index = 0;

        for ticker in tickers {
            let ticker = ticker.as_ref().trim();
            if ticker.is_empty() {
                continue;
            }
            let symbol = ticker.to_uppercase();
            progress.on_start(&symbol, index);
            info!(ticker = %symbol, provider = self.provider.name(), "processing ticker");

            let result = self.process(ticker);
            progress.on_complete(&symbol, index, &result);

            match result {
                Ok(s) => stats.push(s),
                Err(e) => {
                    warn!(ticker = %symbol, kind = ?e.kind(), error = %e, "ticker skipped");
                    errors.push((symbol, e));
                }
            }
            index += 1;
        }

        progress.on_batch_complete(stats.len(), errors.len());

        BatchSummary {
            total: index,
            stats,
            errors,
        }
    }
}

/// Summary of a batch run.
#[derive(Debug)]
pub struct BatchSummary {
    pub total: usize,
    pub stats: StatsBatch,
    pub errors: Vec<(String, DataError)>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.stats.len()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}
