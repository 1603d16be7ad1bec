//! Backtest evaluator — trade-sequence validation, P&L scoring, and the
//! buy-and-hold baseline comparison.

use crate::domain::{round3, Action, Bar, Performance, Trade};
use crate::strategy::{ParamMap, StrategyError, StrategyRegistry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from trade validation and scoring.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("malformed trade sequence: {0}")]
    MalformedTradeSequence(String),

    #[error("empty trade sequence")]
    EmptyTradeSequence,

    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

/// One (strategy, parameter-set) evaluation against its baseline.
///
/// Immutable once constructed; owned by whichever caller requested the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub params: ParamMap,
    pub strategy_performance: Performance,
    pub baseline_performance: Performance,
    pub strategy_trades: Vec<Trade>,
    pub baseline_trades: Vec<Trade>,
}

/// Check the structural invariants of an emitted trade sequence: even
/// length, BUY first, SELL last. A valid sequence partitions into
/// consecutive (BUY, SELL) pairs in emission order.
pub fn validate_trades(trades: &[Trade]) -> Result<(), BacktestError> {
    if trades.len() % 2 != 0 {
        return Err(BacktestError::MalformedTradeSequence(format!(
            "odd number of trades ({})",
            trades.len()
        )));
    }
    if let Some(first) = trades.first() {
        if first.action != Action::Buy {
            return Err(BacktestError::MalformedTradeSequence(
                "first trade must be a BUY".into(),
            ));
        }
    }
    if let Some(last) = trades.last() {
        if last.action != Action::Sell {
            return Err(BacktestError::MalformedTradeSequence(
                "last trade must be a SELL".into(),
            ));
        }
    }
    Ok(())
}

/// Score a validated trade sequence: sum `(sell - buy)` over consecutive
/// pairs, with the percentage taken against the first entry price.
pub fn score(trades: &[Trade]) -> Result<Performance, BacktestError> {
    validate_trades(trades)?;
    let first = trades.first().ok_or(BacktestError::EmptyTradeSequence)?;

    let mut p_and_l = 0.0;
    for pair in trades.chunks_exact(2) {
        p_and_l += pair[1].price - pair[0].price;
    }

    Ok(Performance {
        absolute: round3(p_and_l),
        percentage: round3(p_and_l / first.price * 100.0),
    })
}

/// Buy-and-hold baseline: BUY at the first close, SELL at the last.
///
/// Always exactly one pair. Bars without a close carry no price and are
/// ignored; a range with no closes at all cannot be baselined.
pub fn baseline(bars: &[Bar]) -> Result<Vec<Trade>, BacktestError> {
    let mut observed = bars.iter().filter_map(|b| b.close.map(|c| (b.timestamp, c)));
    let first = observed.next().ok_or(BacktestError::EmptyTradeSequence)?;
    let last = observed.last().unwrap_or(first);

    Ok(vec![
        Trade::new(first.0, Action::Buy, first.1),
        Trade::new(last.0, Action::Sell, last.1),
    ])
}

/// Run one backtest: resolve the strategy, evaluate, validate and score both
/// the strategy trades and the baseline, and bundle everything.
///
/// Propagates whichever error occurred first; never returns a partial
/// result.
pub fn run(
    bars: &[Bar],
    registry: &StrategyRegistry,
    strategy_name: &str,
    params: &ParamMap,
) -> Result<BacktestResult, BacktestError> {
    let strategy = registry.get(strategy_name)?;
    let strategy_trades = strategy.evaluate(bars, params)?;
    let strategy_performance = score(&strategy_trades)?;

    let baseline_trades = baseline(bars)?;
    let baseline_performance = score(&baseline_trades)?;

    Ok(BacktestResult {
        strategy_name: strategy_name.to_string(),
        params: params.clone(),
        strategy_performance,
        baseline_performance,
        strategy_trades,
        baseline_trades,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn trade(hour: u32, action: Action, price: f64) -> Trade {
        Trade::new(at(hour), action, price)
    }

    fn bars_with_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: at(i as u32),
                open: Some(c),
                high: Some(c),
                low: Some(c),
                close: Some(c),
                volume: Some(1.0),
                vwap: None,
                transactions: None,
                otc: None,
            })
            .collect()
    }

    #[test]
    fn score_single_pair() {
        let trades = vec![trade(0, Action::Buy, 100.0), trade(1, Action::Sell, 110.0)];
        let perf = score(&trades).unwrap();
        assert_eq!(perf.absolute, 10.0);
        assert_eq!(perf.percentage, 10.0);
    }

    #[test]
    fn score_sums_pairs_and_rounds() {
        let trades = vec![
            trade(0, Action::Buy, 100.0),
            trade(1, Action::Sell, 103.3333),
            trade(2, Action::Buy, 102.0),
            trade(3, Action::Sell, 101.0),
        ];
        let perf = score(&trades).unwrap();
        assert_eq!(perf.absolute, 2.333);
        assert_eq!(perf.percentage, 2.333);
    }

    #[test]
    fn empty_sequence_is_rejected() {
        assert!(matches!(score(&[]), Err(BacktestError::EmptyTradeSequence)));
    }

    #[test]
    fn sell_before_buy_is_rejected() {
        let trades = vec![trade(0, Action::Sell, 100.0), trade(1, Action::Buy, 110.0)];
        assert!(matches!(
            validate_trades(&trades),
            Err(BacktestError::MalformedTradeSequence(_))
        ));
    }

    #[test]
    fn odd_length_is_rejected() {
        let trades = vec![trade(0, Action::Buy, 100.0)];
        assert!(matches!(
            validate_trades(&trades),
            Err(BacktestError::MalformedTradeSequence(_))
        ));
    }

    #[test]
    fn unclosed_final_position_is_rejected() {
        let trades = vec![
            trade(0, Action::Buy, 100.0),
            trade(1, Action::Sell, 101.0),
            trade(2, Action::Buy, 102.0),
            trade(3, Action::Buy, 103.0),
        ];
        assert!(matches!(
            validate_trades(&trades),
            Err(BacktestError::MalformedTradeSequence(_))
        ));
    }

    #[test]
    fn baseline_takes_first_and_last_close() {
        let bars = bars_with_closes(&[100.0, 105.0, 98.0, 120.0]);
        let trades = baseline(&bars).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].action, Action::Buy);
        assert_eq!(trades[0].price, 100.0);
        assert_eq!(trades[1].action, Action::Sell);
        assert_eq!(trades[1].price, 120.0);
        assert!(validate_trades(&trades).is_ok());
    }

    #[test]
    fn baseline_single_bar_buys_and_sells_at_same_close() {
        let bars = bars_with_closes(&[42.0]);
        let trades = baseline(&bars).unwrap();
        let perf = score(&trades).unwrap();
        assert_eq!(perf.absolute, 0.0);
    }

    #[test]
    fn baseline_of_no_bars_is_an_error() {
        assert!(matches!(
            baseline(&[]),
            Err(BacktestError::EmptyTradeSequence)
        ));
    }

    #[test]
    fn run_bundles_strategy_and_baseline() {
        let bars = bars_with_closes(&[10.0, 10.0, 10.0, 11.0, 12.0, 13.0, 5.0, 4.0, 3.0]);
        let registry = StrategyRegistry::default();
        let mut params = ParamMap::new();
        params.insert("short_window".into(), 2);
        params.insert("long_window".into(), 4);

        let result = run(&bars, &registry, "SMA_CROSSOVER", &params).unwrap();
        assert_eq!(result.strategy_name, "SMA_CROSSOVER");
        assert_eq!(result.params, params);
        assert_eq!(result.baseline_trades.len(), 2);
        assert_eq!(result.baseline_performance.absolute, -7.0);
        assert!(validate_trades(&result.strategy_trades).is_ok());
    }

    #[test]
    fn run_propagates_unknown_strategy() {
        let bars = bars_with_closes(&[1.0, 2.0]);
        let registry = StrategyRegistry::default();
        let err = run(&bars, &registry, "MOMENTUM", &ParamMap::new()).unwrap_err();
        assert!(matches!(
            err,
            BacktestError::Strategy(StrategyError::UnknownStrategy(_))
        ));
    }
}
