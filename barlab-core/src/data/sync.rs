//! Cache synchronizer — gap-filling merge of provider bars into the
//! persisted store.
//!
//! The synchronizer only ever fetches the uncovered edges of a requested
//! range: a left gap before the store's first timestamp and/or a right gap
//! after its last. The interior of the covered span is never re-fetched.
//! Load → merge → persist is synchronous and single-threaded; concurrent
//! synchronization of the same ticker is not a supported path.

use super::cache::ParquetCache;
use super::provider::{BarProvider, DataError};
use super::store::BarStore;
use crate::domain::Bar;
use chrono::NaiveDate;

/// Synchronizes the per-ticker parquet store against a provider.
///
/// Holds the provider capability explicitly; there is no process-wide
/// client state.
pub struct CacheSynchronizer<'a> {
    provider: &'a dyn BarProvider,
    cache: &'a ParquetCache,
}

impl<'a> CacheSynchronizer<'a> {
    pub fn new(provider: &'a dyn BarProvider, cache: &'a ParquetCache) -> Self {
        Self { provider, cache }
    }

    /// Ensure the store covers `[from, to]` and return the bars in that
    /// range, ascending by timestamp.
    ///
    /// Fetch failures propagate as `DataUnavailable`, persistence failures
    /// as `CacheWrite`; neither is retried here.
    pub fn ensure_range(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let store = match self.cache.load(ticker)? {
            None => {
                let fetched = self.provider.fetch_bars(ticker, from, to)?;
                let store = BarStore::new(ticker, fetched);
                if !store.is_empty() {
                    self.cache.write(&store)?;
                }
                store
            }
            Some(mut store) => {
                // Loaded stores are never empty (the cache rejects empty
                // writes), so the span is always present.
                let (min_ts, max_ts) = match store.span() {
                    Some(span) => span,
                    None => {
                        return Err(DataError::CacheRead(format!(
                            "empty persisted store for '{ticker}'"
                        )))
                    }
                };

                let mut incoming: Vec<Bar> = Vec::new();
                if from < min_ts.date() {
                    incoming.extend(self.provider.fetch_bars(ticker, from, min_ts.date())?);
                }
                if to > max_ts.date() {
                    incoming.extend(self.provider.fetch_bars(ticker, max_ts.date(), to)?);
                }

                // An empty gap fetch contributes nothing; the store is only
                // merged and rewritten when something new arrived.
                if !incoming.is_empty() {
                    store.merge(incoming);
                    self.cache.write(&store)?;
                }
                store
            }
        };

        Ok(store.slice_days(from, to))
    }
}
