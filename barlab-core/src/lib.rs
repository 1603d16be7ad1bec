//! barlab core — cached market data and strategy backtesting.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, trades, performance records)
//! - Data layer: provider capability, per-ticker parquet cache, and the
//!   gap-filling cache synchronizer
//! - Strategy engine: SMA crossover behind a name-keyed registry
//! - Backtest evaluator: trade validation, P&L scoring, buy-and-hold
//!   baseline
//!
//! Parameter-space search lives in `barlab-runner`, on top of this crate.

pub mod backtest;
pub mod data;
pub mod domain;
pub mod strategy;
