//! CSV export of sweep results for the parameter-surface charting layer.

use anyhow::{Context, Result};
use std::path::Path;

use barlab_core::backtest::BacktestResult;

/// Write one row per result: the parameter pair plus strategy and baseline
/// performance. Parameters absent from a result's map are left blank.
pub fn export_csv(results: &[BacktestResult], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create csv at {}", path.display()))?;

    writer.write_record([
        "strategy",
        "short_window",
        "long_window",
        "strategy_abs",
        "strategy_pct",
        "baseline_abs",
        "baseline_pct",
        "trade_count",
    ])?;

    for result in results {
        let param = |name: &str| {
            result
                .params
                .get(name)
                .map(|v| v.to_string())
                .unwrap_or_default()
        };
        writer.write_record([
            result.strategy_name.clone(),
            param("short_window"),
            param("long_window"),
            result.strategy_performance.absolute.to_string(),
            result.strategy_performance.percentage.to_string(),
            result.baseline_performance.absolute.to_string(),
            result.baseline_performance.percentage.to_string(),
            result.strategy_trades.len().to_string(),
        ])?;
    }

    writer.flush().context("flush csv")?;
    Ok(())
}
