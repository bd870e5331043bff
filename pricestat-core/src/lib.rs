//! pricestat core — fetch, decode, aggregate, and persist daily closing prices.
//!
//! This crate contains the whole per-ticker pipeline:
//! - Domain types (ticker requests, price points, series, summary statistics)
//! - Nasdaq chart fetcher over a blocking HTTP client
//! - Envelope decoder tolerant of both provider response shapes
//! - Pure closing-price aggregator (min, max, mean, median)
//! - Interactive, overwrite-safe persistence of the result batch

pub mod config;
pub mod data;
pub mod domain;
pub mod persist;
pub mod prompt;
pub mod stats;

pub use config::{Config, ConfigError, ProviderConfig};
pub use data::{
    decode, BatchProgress, BatchSummary, DataError, DecodedChart, FailureKind, NasdaqProvider,
    PriceProvider, StatsPipeline, StdoutProgress,
};
pub use domain::{PricePoint, PriceSeries, RawPayload, StatsBatch, TickerRequest, TickerStats};
pub use persist::{load_batch, persist, PersistError, Persister, SaveOutcome, SaveState};
pub use prompt::{ask_yes_no, ConsoleOperator, Operator, PromptError, ScriptedOperator, TickerPrompt};
pub use stats::aggregate;
