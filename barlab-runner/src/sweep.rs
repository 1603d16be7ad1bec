//! Parameter sweep — parallel grid search over SMA window pairs.
//!
//! Each grid point is an independent, side-effect-free backtest; workers
//! share nothing but the input bars and the registry. Callers should
//! synchronize the bar range once before sweeping so workers never touch
//! the cache.

use rayon::prelude::*;
use thiserror::Error;

use barlab_core::backtest::{run, BacktestError, BacktestResult};
use barlab_core::domain::Bar;
use barlab_core::strategy::{ParamMap, StrategyRegistry};

/// Errors from a parameter sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("backtest failed at short_window={short_window}, long_window={long_window}: {source}")]
    Evaluation {
        short_window: usize,
        long_window: usize,
        #[source]
        source: BacktestError,
    },

    #[error("worker pool: {0}")]
    Pool(String),
}

/// Grid of (short_window, long_window) candidates.
///
/// Short windows step through `[short_start, short_end)`; for each, long
/// windows step through `[short + step, long_end)`. The `long > short`
/// constraint holds by construction and is never re-checked downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamGrid {
    pub short_start: usize,
    pub short_end: usize,
    pub long_end: usize,
    pub step: usize,
}

impl ParamGrid {
    /// Every candidate pair, each exactly once.
    pub fn points(&self) -> Vec<(usize, usize)> {
        let mut points = Vec::new();
        let mut short = self.short_start;
        while short < self.short_end {
            let mut long = short + self.step;
            while long < self.long_end {
                points.push((short, long));
                long += self.step;
            }
            short += self.step;
        }
        points
    }

    pub fn len(&self) -> usize {
        self.points().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Evaluate every grid point on a fixed-size worker pool.
///
/// Result order is unspecified beyond each grid point appearing exactly
/// once. The first evaluation failure aborts the whole search; no partial
/// result set is returned — callers wanting partial results retry narrower
/// ranges themselves.
pub fn search(
    bars: &[Bar],
    registry: &StrategyRegistry,
    strategy_name: &str,
    grid: &ParamGrid,
    concurrency: usize,
) -> Result<Vec<BacktestResult>, SweepError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .build()
        .map_err(|e| SweepError::Pool(e.to_string()))?;

    let points = grid.points();
    pool.install(|| {
        points
            .par_iter()
            .map(|&(short_window, long_window)| {
                let mut params = ParamMap::new();
                params.insert("short_window".into(), short_window);
                params.insert("long_window".into(), long_window);
                run(bars, registry, strategy_name, &params).map_err(|source| {
                    SweepError::Evaluation {
                        short_window,
                        long_window,
                        source,
                    }
                })
            })
            .collect()
    })
}
