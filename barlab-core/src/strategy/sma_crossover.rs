//! SMA crossover strategy — golden/death cross over close prices.
//!
//! Long-only, single-unit position state machine: BUY when the short SMA is
//! above the long SMA while flat, SELL when it drops below while long, and a
//! synthetic SELL at the final close if the position is still open after the
//! last bar.
//!
//! Two evaluation forms are provided: `evaluate_streaming` walks the bars
//! once with a running close history, `evaluate_batch` precomputes both SMA
//! series and then scans them. They emit identical trade sequences for
//! identical inputs; window means are taken over the same slices in the same
//! order in both forms so the comparison never diverges on rounding.

use super::params::{param_or, validate_params, ParamMap};
use super::{Strategy, StrategyError};
use crate::domain::{Action, Bar, Trade};
use chrono::NaiveDateTime;

const ALLOWED_PARAMS: [&str; 2] = ["short_window", "long_window"];
const DEFAULT_SHORT_WINDOW: usize = 5;
const DEFAULT_LONG_WINDOW: usize = 10;

/// Typed SMA crossover configuration, built from a validated parameter map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmaParams {
    pub short_window: usize,
    pub long_window: usize,
}

impl SmaParams {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, StrategyError> {
        if short_window == 0 || short_window >= long_window {
            return Err(StrategyError::InvalidParameters(format!(
                "window sizes must satisfy 0 < short_window < long_window, \
                 got short_window={short_window}, long_window={long_window}"
            )));
        }
        Ok(Self {
            short_window,
            long_window,
        })
    }

    /// Validate a raw parameter map and apply defaults (short=5, long=10).
    pub fn from_map(params: &ParamMap) -> Result<Self, StrategyError> {
        validate_params(params, &ALLOWED_PARAMS)?;
        Self::new(
            param_or(params, "short_window", DEFAULT_SHORT_WINDOW),
            param_or(params, "long_window", DEFAULT_LONG_WINDOW),
        )
    }
}

/// Crossover signal rule under the current position.
fn crossover_signal(short_sma: f64, long_sma: f64, long: bool) -> Action {
    if short_sma > long_sma && !long {
        Action::Buy
    } else if short_sma < long_sma && long {
        Action::Sell
    } else {
        Action::Hold
    }
}

/// Mean of the trailing `window` closes, summed left to right.
fn window_mean(closes: &[f64], window: usize) -> f64 {
    closes[closes.len() - window..].iter().sum::<f64>() / window as f64
}

/// Apply one signal to the trade list and position state.
fn apply_signal(
    signal: Action,
    time: NaiveDateTime,
    price: f64,
    long: &mut bool,
    trades: &mut Vec<Trade>,
) {
    match signal {
        Action::Buy => {
            trades.push(Trade::new(time, Action::Buy, price));
            *long = true;
        }
        Action::Sell => {
            trades.push(Trade::new(time, Action::Sell, price));
            *long = false;
        }
        Action::Hold => {}
    }
}

/// Streaming form: one pass over the bars with a running close history.
///
/// Bars without a close price carry no observation and are skipped.
pub fn evaluate_streaming(bars: &[Bar], params: &SmaParams) -> Vec<Trade> {
    let mut closes: Vec<f64> = Vec::with_capacity(bars.len());
    let mut long = false;
    let mut trades: Vec<Trade> = Vec::new();
    let mut last_seen: Option<(NaiveDateTime, f64)> = None;

    for bar in bars {
        let Some(close) = bar.close else { continue };
        closes.push(close);
        last_seen = Some((bar.timestamp, close));

        // Both SMAs are undefined until long_window closes are in.
        if closes.len() < params.long_window {
            continue;
        }
        let short_sma = window_mean(&closes, params.short_window);
        let long_sma = window_mean(&closes, params.long_window);

        let signal = crossover_signal(short_sma, long_sma, long);
        apply_signal(signal, bar.timestamp, close, &mut long, &mut trades);
    }

    // Never return an unmatched open position.
    if long {
        let (time, price) = last_seen.expect("a position implies at least one close");
        trades.push(Trade::new(time, Action::Sell, price));
    }

    trades
}

/// Batch form: precompute both SMA series, then scan the signal rule.
///
/// NaN marks indices before the warmup, mirroring how indicator vectors are
/// usually materialized.
pub fn evaluate_batch(bars: &[Bar], params: &SmaParams) -> Vec<Trade> {
    let observed: Vec<(NaiveDateTime, f64)> = bars
        .iter()
        .filter_map(|b| b.close.map(|c| (b.timestamp, c)))
        .collect();
    let closes: Vec<f64> = observed.iter().map(|(_, c)| *c).collect();

    let short_series = sma_series(&closes, params.short_window);
    let long_series = sma_series(&closes, params.long_window);

    let mut long = false;
    let mut trades: Vec<Trade> = Vec::new();

    for (i, &(time, close)) in observed.iter().enumerate() {
        if i + 1 < params.long_window {
            continue;
        }
        let (short_sma, long_sma) = (short_series[i], long_series[i]);
        debug_assert!(!short_sma.is_nan() && !long_sma.is_nan());

        let signal = crossover_signal(short_sma, long_sma, long);
        apply_signal(signal, time, close, &mut long, &mut trades);
    }

    if long {
        let &(time, close) = observed.last().expect("a position implies observations");
        trades.push(Trade::new(time, Action::Sell, close));
    }

    trades
}

/// Full SMA vector over `closes`; NaN before the first complete window.
fn sma_series(closes: &[f64], window: usize) -> Vec<f64> {
    let mut series = vec![f64::NAN; closes.len()];
    for i in 0..closes.len() {
        if i + 1 >= window {
            series[i] = window_mean(&closes[..=i], window);
        }
    }
    series
}

/// The SMA crossover strategy as a registry entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmaCrossover;

impl Strategy for SmaCrossover {
    fn name(&self) -> &str {
        "SMA_CROSSOVER"
    }

    fn allowed_params(&self) -> &'static [&'static str] {
        &ALLOWED_PARAMS
    }

    fn evaluate(&self, bars: &[Bar], params: &ParamMap) -> Result<Vec<Trade>, StrategyError> {
        let config = SmaParams::from_map(params)?;
        Ok(evaluate_streaming(bars, &config))
    }
}
