//! pricestat CLI — closing-price statistics for one or more tickers.
//!
//! Modes:
//! - batch: `pricestat MSFT AAPL` processes the given tickers in order
//! - interactive: `pricestat` prompts for tickers until `STOP`
//!
//! After the run the results can be saved as a JSON array to a file chosen at
//! the prompt (`--save` / `--no-save` skip the question).

use anyhow::{Context, Result};
use clap::Parser;
use pricestat_core::{
    ask_yes_no, persist, Config, ConsoleOperator, NasdaqProvider, SaveOutcome, StatsPipeline,
    StdoutProgress, TickerPrompt,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "pricestat",
    about = "Five-year closing-price statistics from the Nasdaq chart API"
)]
#[command(version)]
struct Cli {
    /// Tickers to process (e.g., MSFT AAPL). Prompts interactively when omitted.
    tickers: Vec<String>,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save results without asking first.
    #[arg(long, default_value_t = false, conflicts_with = "no_save")]
    save: bool,

    /// Never save results.
    #[arg(long, default_value_t = false)]
    no_save: bool,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let provider =
        NasdaqProvider::new(&config.provider).context("failed to build HTTP client")?;
    let pipeline = StatsPipeline::new(&provider, config.provider.lookback_years);
    let progress = StdoutProgress;
    let mut operator = ConsoleOperator::stdio();

    let summary = if cli.tickers.is_empty() {
        pipeline.run(TickerPrompt::new(&mut operator), &progress)
    } else {
        pipeline.run(&cli.tickers, &progress)
    };

    if summary.stats.is_empty() {
        println!("No results to save.");
        return Ok(());
    }

    let save = if cli.save {
        true
    } else if cli.no_save {
        false
    } else {
        ask_yes_no(&mut operator, "Save results to a file? (y/n): ")
            .context("interrupted while asking to save")?
    };
    if !save {
        return Ok(());
    }

    match persist(&summary.stats, &mut operator).context("interrupted while saving results")? {
        SaveOutcome::Written { complete: true, .. } => {}
        SaveOutcome::Written { path, complete: false } => {
            eprintln!("Warning: {} may be incomplete", path.display());
        }
        SaveOutcome::Cancelled => println!("Save cancelled."),
    }

    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pricestat_core={level},pricestat={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
