//! Bar — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One aggregated OHLCV observation over a fixed time window.
///
/// All price and volume fields are nullable: aggregate feeds routinely omit
/// columns (`vwap`, `otc`) and occasionally whole quote fields. Only the
/// timestamp is guaranteed, and it is the identity of the bar within a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    pub vwap: Option<f64>,
    pub transactions: Option<i64>,
    pub otc: Option<bool>,
}

impl Bar {
    /// Millisecond epoch of the bar's timestamp. Merge key within a store.
    pub fn epoch_millis(&self) -> i64 {
        self.timestamp.and_utc().timestamp_millis()
    }

    /// Basic OHLC sanity check; bars missing any OHLC field are not sane.
    pub fn is_sane(&self) -> bool {
        match (self.open, self.high, self.low, self.close) {
            (Some(o), Some(h), Some(l), Some(c)) => {
                h >= l && h >= o && h >= c && l <= o && l <= c && o > 0.0 && c > 0.0
            }
            _ => false,
        }
    }
}
