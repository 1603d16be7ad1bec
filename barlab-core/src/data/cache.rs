//! Parquet cache layer — one columnar file per ticker.
//!
//! Layout: `{cache_dir}/{TICKER}.parquet` plus a `{TICKER}.meta.json`
//! sidecar (bar count, covered span, content hash).
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - Whole-file rewrite on every merge (never appended in place)
//! - Integrity validation on load (schema check, row count > 0)
//!
//! Single writer per ticker is a documented constraint; there is no file
//! locking against concurrent synchronizers.

use super::provider::DataError;
use super::store::BarStore;
use crate::domain::Bar;
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const EXPECTED_COLUMNS: [&str; 9] = [
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "vwap",
    "transactions",
    "otc",
];

/// Metadata sidecar for a cached ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub ticker: String,
    pub start_ts: NaiveDateTime,
    pub end_ts: NaiveDateTime,
    pub bar_count: usize,
    pub data_hash: String,
    pub cached_at: NaiveDateTime,
}

/// Cache status for a single ticker, for CLI reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub ticker: String,
    pub cached: bool,
    pub start_ts: Option<NaiveDateTime>,
    pub end_ts: Option<NaiveDateTime>,
    pub bar_count: Option<usize>,
}

/// The parquet cache.
pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path to the parquet file for a ticker: `{cache_dir}/{TICKER}.parquet`
    fn ticker_path(&self, ticker: &str) -> PathBuf {
        self.cache_dir.join(format!("{ticker}.parquet"))
    }

    /// Path to the metadata sidecar for a ticker.
    fn meta_path(&self, ticker: &str) -> PathBuf {
        self.cache_dir.join(format!("{ticker}.meta.json"))
    }

    /// Persist a store as the new canonical file for its ticker.
    ///
    /// The write is atomic: parquet goes to a .tmp path first and is renamed
    /// into place, so a crash never leaves a truncated canonical file.
    pub fn write(&self, store: &BarStore) -> Result<(), DataError> {
        let bars = store.bars();
        if bars.is_empty() {
            return Err(DataError::CacheWrite("no bars to cache".into()));
        }

        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheWrite(format!("failed to create cache dir: {e}")))?;

        let df = bars_to_dataframe(bars)?;
        let path = self.ticker_path(store.ticker());
        let tmp_path = path.with_extension("parquet.tmp");

        write_parquet(&df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheWrite(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            ticker: store.ticker().to_string(),
            start_ts: bars[0].timestamp,
            end_ts: bars[bars.len() - 1].timestamp,
            bar_count: bars.len(),
            data_hash: blake3::hash(
                &serde_json::to_vec(bars)
                    .map_err(|e| DataError::CacheWrite(format!("hash serialization: {e}")))?,
            )
            .to_hex()
            .to_string(),
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheWrite(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(store.ticker()), meta_json)
            .map_err(|e| DataError::CacheWrite(format!("meta write: {e}")))?;

        Ok(())
    }

    /// Load the persisted store for a ticker, sorted ascending by timestamp.
    ///
    /// `Ok(None)` when no file exists for the ticker; a present-but-invalid
    /// file is an error.
    pub fn load(&self, ticker: &str) -> Result<Option<BarStore>, DataError> {
        let path = self.ticker_path(ticker);
        if !path.exists() {
            return Ok(None);
        }
        let bars = load_and_validate_parquet(&path)?;
        Ok(Some(BarStore::new(ticker, bars)))
    }

    /// Metadata sidecar for a ticker, if present and parseable.
    pub fn meta(&self, ticker: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(ticker)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Which tickers have cached data, and their covered spans.
    pub fn status(&self, tickers: &[&str]) -> Vec<CacheStatus> {
        tickers
            .iter()
            .map(|ticker| {
                let meta = self.meta(ticker);
                CacheStatus {
                    ticker: ticker.to_string(),
                    cached: meta.is_some(),
                    start_ts: meta.as_ref().map(|m| m.start_ts),
                    end_ts: meta.as_ref().map(|m| m.end_ts),
                    bar_count: meta.as_ref().map(|m| m.bar_count),
                }
            })
            .collect()
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

/// Convert bars to a polars DataFrame with the canonical column set.
fn bars_to_dataframe(bars: &[Bar]) -> Result<DataFrame, DataError> {
    let timestamps: Vec<i64> = bars.iter().map(|b| b.epoch_millis()).collect();
    let opens: Vec<Option<f64>> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<Option<f64>> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<Option<f64>> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<Option<f64>> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<Option<f64>> = bars.iter().map(|b| b.volume).collect();
    let vwaps: Vec<Option<f64>> = bars.iter().map(|b| b.vwap).collect();
    let transactions: Vec<Option<i64>> = bars.iter().map(|b| b.transactions).collect();
    let otcs: Vec<Option<bool>> = bars.iter().map(|b| b.otc).collect();

    DataFrame::new(vec![
        Column::new("timestamp".into(), timestamps)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .map_err(|e| DataError::CacheWrite(format!("timestamp cast: {e}")))?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
        Column::new("vwap".into(), vwaps),
        Column::new("transactions".into(), transactions),
        Column::new("otc".into(), otcs),
    ])
    .map_err(|e| DataError::CacheWrite(format!("dataframe creation: {e}")))
}

/// Write a DataFrame to a parquet file.
fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let file = fs::File::create(path)
        .map_err(|e| DataError::CacheWrite(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::CacheWrite(format!("write parquet: {e}")))?;
    Ok(())
}

/// Load a parquet file and validate its integrity.
fn load_and_validate_parquet(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::CacheRead(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::CacheRead(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::SchemaMismatch("empty parquet file".into()));
    }
    for col_name in &EXPECTED_COLUMNS {
        if df.column(col_name).is_err() {
            return Err(DataError::SchemaMismatch(format!(
                "missing column '{col_name}'"
            )));
        }
    }

    dataframe_to_bars(&df)
}

/// Convert a DataFrame back to bars.
fn dataframe_to_bars(df: &DataFrame) -> Result<Vec<Bar>, DataError> {
    let map_err = |e: PolarsError| DataError::CacheRead(format!("column read: {e}"));

    let ts_ca = df
        .column("timestamp")
        .map_err(map_err)?
        .datetime()
        .map_err(|e| DataError::SchemaMismatch(format!("timestamp column type: {e}")))?
        .clone();
    let f64_ca = |name: &str| -> Result<Float64Chunked, DataError> {
        Ok(df
            .column(name)
            .map_err(map_err)?
            .f64()
            .map_err(|e| DataError::SchemaMismatch(format!("{name} column type: {e}")))?
            .clone())
    };
    let opens = f64_ca("open")?;
    let highs = f64_ca("high")?;
    let lows = f64_ca("low")?;
    let closes = f64_ca("close")?;
    let volumes = f64_ca("volume")?;
    let vwaps = f64_ca("vwap")?;
    let transactions = df
        .column("transactions")
        .map_err(map_err)?
        .i64()
        .map_err(|e| DataError::SchemaMismatch(format!("transactions column type: {e}")))?
        .clone();
    let otcs = df
        .column("otc")
        .map_err(map_err)?
        .bool()
        .map_err(|e| DataError::SchemaMismatch(format!("otc column type: {e}")))?
        .clone();

    let mut bars = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let millis = ts_ca
            .get(i)
            .ok_or_else(|| DataError::CacheRead(format!("null timestamp at row {i}")))?;
        let timestamp = chrono::DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| DataError::CacheRead(format!("timestamp out of range at row {i}")))?
            .naive_utc();

        bars.push(Bar {
            timestamp,
            open: opens.get(i),
            high: highs.get(i),
            low: lows.get(i),
            close: closes.get(i),
            volume: volumes.get(i),
            vwap: vwaps.get(i),
            transactions: transactions.get(i),
            otc: otcs.get(i),
        });
    }

    Ok(bars)
}
