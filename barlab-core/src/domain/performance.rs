//! Performance — P&L summary for a scored trade sequence.

use serde::{Deserialize, Serialize};

/// Absolute and percentage P&L of a trade sequence. Derived by the
/// evaluator, never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    /// Summed `(sell - buy)` over consecutive pairs, rounded to 3 decimals.
    pub absolute: f64,
    /// Absolute P&L relative to the entry price, in percent, rounded to
    /// 3 decimals.
    pub percentage: f64,
}

/// Round to three decimal places, matching the scoring contract.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
