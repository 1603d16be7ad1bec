//! barlab CLI — download, backtest, sweep, and cache management commands.
//!
//! Commands:
//! - `download` — synchronize the parquet cache for a ticker and date range
//! - `backtest` — run one strategy evaluation against its baseline
//! - `sweep` — parallel grid search over SMA window pairs
//! - `cache status` — report cached tickers and their covered spans
//!
//! The Polygon API key is read from the `POLYGON_API_KEY` environment
//! variable.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use barlab_core::backtest;
use barlab_core::data::{CacheSynchronizer, ParquetCache, PolygonProvider};
use barlab_core::domain::Bar;
use barlab_core::strategy::{ParamMap, StrategyRegistry};
use barlab_runner::{export_csv, search, ParamGrid};

#[derive(Parser)]
#[command(name = "barlab", about = "barlab CLI — cached bar backtesting engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize the parquet cache for a ticker and date range.
    Download {
        /// Ticker, e.g. X:BTCUSD.
        ticker: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        to: String,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Run one backtest and print the result as JSON.
    Backtest {
        /// Ticker, e.g. X:BTCUSD.
        ticker: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        to: String,

        /// Strategy name.
        #[arg(long, default_value = "SMA_CROSSOVER")]
        strategy: String,

        /// Short SMA window.
        #[arg(long, default_value_t = 5)]
        short_window: usize,

        /// Long SMA window.
        #[arg(long, default_value_t = 10)]
        long_window: usize,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Parallel grid search over SMA window pairs.
    Sweep {
        /// Ticker, e.g. X:BTCUSD.
        ticker: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        to: String,

        /// Strategy name.
        #[arg(long, default_value = "SMA_CROSSOVER")]
        strategy: String,

        /// First short window (inclusive).
        #[arg(long, default_value_t = 10)]
        short_start: usize,

        /// Short window upper bound (exclusive).
        #[arg(long, default_value_t = 290)]
        short_end: usize,

        /// Long window upper bound (exclusive).
        #[arg(long, default_value_t = 300)]
        long_end: usize,

        /// Grid step for both windows.
        #[arg(long, default_value_t = 5)]
        step: usize,

        /// Number of worker threads.
        #[arg(long, default_value_t = 5)]
        concurrency: usize,

        /// Write the full result grid to this CSV file.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached tickers and their covered spans.
    Status {
        /// Tickers to report on.
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            ticker,
            from,
            to,
            cache_dir,
        } => run_download(&ticker, &from, &to, &cache_dir),
        Commands::Backtest {
            ticker,
            from,
            to,
            strategy,
            short_window,
            long_window,
            cache_dir,
        } => run_backtest_cmd(
            &ticker,
            &from,
            &to,
            &strategy,
            short_window,
            long_window,
            &cache_dir,
        ),
        Commands::Sweep {
            ticker,
            from,
            to,
            strategy,
            short_start,
            short_end,
            long_end,
            step,
            concurrency,
            out,
            cache_dir,
        } => run_sweep_cmd(
            &ticker,
            &from,
            &to,
            &strategy,
            ParamGrid {
                short_start,
                short_end,
                long_end,
                step,
            },
            concurrency,
            out,
            &cache_dir,
        ),
        Commands::Cache { action } => match action {
            CacheAction::Status { tickers, cache_dir } => run_cache_status(&tickers, &cache_dir),
        },
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

/// Synchronize the cache and return the requested slice.
fn sync_bars(ticker: &str, from: &str, to: &str, cache_dir: &PathBuf) -> Result<Vec<Bar>> {
    let from = parse_date(from)?;
    let to = parse_date(to)?;
    if from > to {
        bail!("start date {from} is after end date {to}");
    }

    let provider = PolygonProvider::from_env()?;
    let cache = ParquetCache::new(cache_dir);
    let sync = CacheSynchronizer::new(&provider, &cache);
    let bars = sync.ensure_range(ticker, from, to)?;
    Ok(bars)
}

fn run_download(ticker: &str, from: &str, to: &str, cache_dir: &PathBuf) -> Result<()> {
    let bars = sync_bars(ticker, from, to, cache_dir)?;
    println!("{ticker}: {} bars covering {from} to {to}", bars.len());
    Ok(())
}

fn run_backtest_cmd(
    ticker: &str,
    from: &str,
    to: &str,
    strategy: &str,
    short_window: usize,
    long_window: usize,
    cache_dir: &PathBuf,
) -> Result<()> {
    let bars = sync_bars(ticker, from, to, cache_dir)?;
    let registry = StrategyRegistry::default();
    let mut params = ParamMap::new();
    params.insert("short_window".into(), short_window);
    params.insert("long_window".into(), long_window);

    let result = backtest::run(&bars, &registry, strategy, &params)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_sweep_cmd(
    ticker: &str,
    from: &str,
    to: &str,
    strategy: &str,
    grid: ParamGrid,
    concurrency: usize,
    out: Option<PathBuf>,
    cache_dir: &PathBuf,
) -> Result<()> {
    if grid.is_empty() {
        bail!("parameter grid is empty");
    }

    // Synchronize once up front so no worker ever writes the cache.
    let bars = sync_bars(ticker, from, to, cache_dir)?;
    println!(
        "sweeping {} grid points over {} bars on {concurrency} workers...",
        grid.len(),
        bars.len()
    );

    let registry = StrategyRegistry::default();
    let mut results = search(&bars, &registry, strategy, &grid, concurrency)?;

    results.sort_by(|a, b| {
        b.strategy_performance
            .percentage
            .partial_cmp(&a.strategy_performance.percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for result in results.iter().take(10) {
        println!(
            "short={:<4} long={:<4} strategy {:>9.3}%  baseline {:>9.3}%",
            result.params["short_window"],
            result.params["long_window"],
            result.strategy_performance.percentage,
            result.baseline_performance.percentage,
        );
    }

    if let Some(path) = out {
        export_csv(&results, &path)?;
        println!("wrote {} rows to {}", results.len(), path.display());
    }

    Ok(())
}

fn run_cache_status(tickers: &[String], cache_dir: &PathBuf) -> Result<()> {
    let cache = ParquetCache::new(cache_dir);
    let refs: Vec<&str> = tickers.iter().map(String::as_str).collect();
    for status in cache.status(&refs) {
        if status.cached {
            println!(
                "{}: {} bars, {} to {}",
                status.ticker,
                status.bar_count.unwrap_or(0),
                status.start_ts.map(|t| t.to_string()).unwrap_or_default(),
                status.end_ts.map(|t| t.to_string()).unwrap_or_default(),
            );
        } else {
            println!("{}: not cached", status.ticker);
        }
    }
    Ok(())
}
