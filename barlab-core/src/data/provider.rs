//! Data provider trait and structured error types.
//!
//! The BarProvider trait abstracts over aggregate-bar sources (Polygon,
//! fixtures, mocks for tests) so the cache synchronizer never knows which
//! backend it is talking to. Providers return bars in ascending timestamp
//! order for a single contiguous range.

use crate::domain::Bar;
use chrono::NaiveDate;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data unavailable for '{ticker}': {reason}")]
    DataUnavailable { ticker: String, reason: String },

    #[error("cache write failed: {0}")]
    CacheWrite(String),

    #[error("cache read failed: {0}")]
    CacheRead(String),

    #[error("cache schema mismatch: {0}")]
    SchemaMismatch(String),
}

/// Trait for aggregate-bar providers.
///
/// The cache layer sits above this trait — providers don't know about the
/// cache. A fetch failure of any kind surfaces as `DataUnavailable`; there
/// is no retry at this layer, retry policy belongs to the caller.
pub trait BarProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch bars for a ticker over an inclusive date range, ascending by
    /// timestamp.
    fn fetch_bars(&self, ticker: &str, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<Bar>, DataError>;
}
