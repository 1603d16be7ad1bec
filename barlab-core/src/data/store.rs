//! BarStore — the in-memory ordered bar collection for one ticker.
//!
//! Invariants: timestamps are unique after merge, and the store is always
//! sorted ascending by timestamp so range queries are simple scans.

use crate::domain::Bar;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// Ordered sequence of bars for a single ticker.
///
/// Mutated only by merge-append; stored bars are never edited in place.
#[derive(Debug, Clone)]
pub struct BarStore {
    ticker: String,
    bars: Vec<Bar>,
}

impl BarStore {
    /// Build a store from bars in any order. Duplicate timestamps keep the
    /// later element of `bars`.
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Self {
        let mut store = Self {
            ticker: ticker.into(),
            bars: Vec::new(),
        };
        store.merge(bars);
        store
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Covered span `[min_ts, max_ts]`, or None for an empty store.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }

    /// Merge fetched bars into the store: dedup by timestamp with the
    /// incoming bar winning on collision, then re-sort ascending.
    pub fn merge(&mut self, fetched: Vec<Bar>) {
        if fetched.is_empty() && !self.bars.is_empty() {
            return;
        }
        let mut by_ts: BTreeMap<i64, Bar> = BTreeMap::new();
        for bar in self.bars.drain(..) {
            by_ts.insert(bar.epoch_millis(), bar);
        }
        for bar in fetched {
            by_ts.insert(bar.epoch_millis(), bar);
        }
        self.bars = by_ts.into_values().collect();
    }

    /// Bars whose timestamp falls in `[from, to]`, inclusive of both whole
    /// days. The end bound is the following midnight, exclusive, so
    /// sub-second timestamps on the final day are kept.
    pub fn slice_days(&self, from: NaiveDate, to: NaiveDate) -> Vec<Bar> {
        let start = from.and_hms_opt(0, 0, 0).expect("midnight is valid");
        let end = to
            .succ_opt()
            .map(|next| next.and_hms_opt(0, 0, 0).expect("midnight is valid"));
        self.bars
            .iter()
            .filter(|b| b.timestamp >= start && end.map_or(true, |e| b.timestamp < e))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar_at(day: u32, hour: u32, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 4, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            open: Some(close - 1.0),
            high: Some(close + 1.0),
            low: Some(close - 2.0),
            close: Some(close),
            volume: Some(1000.0),
            vwap: None,
            transactions: None,
            otc: None,
        }
    }

    #[test]
    fn new_sorts_ascending() {
        let store = BarStore::new("X:BTCUSD", vec![bar_at(3, 0, 3.0), bar_at(1, 0, 1.0)]);
        let closes: Vec<f64> = store.bars().iter().filter_map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 3.0]);
    }

    #[test]
    fn merge_dedups_keeping_incoming() {
        let mut store = BarStore::new("X:BTCUSD", vec![bar_at(1, 0, 1.0), bar_at(2, 0, 2.0)]);
        store.merge(vec![bar_at(2, 0, 99.0), bar_at(3, 0, 3.0)]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.bars()[1].close, Some(99.0));
    }

    #[test]
    fn merge_empty_is_noop() {
        let mut store = BarStore::new("X:BTCUSD", vec![bar_at(1, 0, 1.0)]);
        let before = store.bars().to_vec();
        store.merge(vec![]);
        assert_eq!(store.bars(), before.as_slice());
    }

    #[test]
    fn slice_days_is_inclusive() {
        let store = BarStore::new(
            "X:BTCUSD",
            vec![
                bar_at(1, 0, 1.0),
                bar_at(2, 12, 2.0),
                bar_at(3, 23, 3.0),
                bar_at(4, 0, 4.0),
            ],
        );
        let slice = store.slice_days(
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 3).unwrap(),
        );
        let closes: Vec<f64> = slice.iter().filter_map(|b| b.close).collect();
        assert_eq!(closes, vec![2.0, 3.0]);
    }

    #[test]
    fn slice_days_keeps_subsecond_timestamps_on_final_day() {
        let mut late = bar_at(3, 23, 3.0);
        late.timestamp = NaiveDate::from_ymd_opt(2024, 4, 3)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 500)
            .unwrap();
        let store = BarStore::new("X:BTCUSD", vec![bar_at(2, 0, 2.0), late, bar_at(4, 0, 4.0)]);

        let slice = store.slice_days(
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 3).unwrap(),
        );
        let closes: Vec<f64> = slice.iter().filter_map(|b| b.close).collect();
        assert_eq!(closes, vec![2.0, 3.0]);
    }

    #[test]
    fn span_of_empty_store_is_none() {
        let store = BarStore::new("X:BTCUSD", vec![]);
        assert!(store.span().is_none());
    }
}
