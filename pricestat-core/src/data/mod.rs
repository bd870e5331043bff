//! Fetching and decoding provider chart data

pub mod decode;
pub mod nasdaq;
pub mod pipeline;
pub mod provider;

pub use decode::{decode, DecodedChart};
pub use nasdaq::NasdaqProvider;
pub use pipeline::{BatchSummary, StatsPipeline};
pub use provider::{BatchProgress, DataError, FailureKind, PriceProvider, StdoutProgress};
