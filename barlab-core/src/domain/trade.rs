//! Trade — a single BUY or SELL emitted by a strategy.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// What a strategy decided to do on a given bar.
///
/// `Hold` exists only as an internal signal value; it never appears in an
/// emitted trade sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

/// One emitted trade. Immutable once constructed; strategies and the
/// baseline constructor are the only producers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub time: NaiveDateTime,
    pub action: Action,
    pub price: f64,
}

impl Trade {
    pub fn new(time: NaiveDateTime, action: Action, price: f64) -> Self {
        Self {
            time,
            action,
            price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = Trade::new(
            NaiveDate::from_ymd_opt(2024, 4, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            Action::Buy,
            103.25,
        );
        let json = serde_json::to_string(&trade).unwrap();
        let deser: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
