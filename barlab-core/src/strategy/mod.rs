//! Strategy engine: pure bar-sequence → trade-sequence functions behind a
//! name-keyed registry.

pub mod params;
pub mod sma_crossover;

pub use params::{param_or, validate_params, ParamMap};
pub use sma_crossover::{evaluate_batch, evaluate_streaming, SmaCrossover, SmaParams};

use crate::domain::{Bar, Trade};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors from parameter validation and strategy lookup.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),
}

/// A strategy maps an ordered bar sequence plus parameters to an ordered
/// trade sequence. Pure: no hidden state, no randomness; output depends only
/// on the inputs.
pub trait Strategy: Send + Sync + std::fmt::Debug {
    /// Registry key, e.g. `SMA_CROSSOVER`.
    fn name(&self) -> &str;

    /// The closed set of parameter keys this strategy accepts.
    fn allowed_params(&self) -> &'static [&'static str];

    /// Evaluate the strategy over chronologically ordered bars.
    fn evaluate(&self, bars: &[Bar], params: &ParamMap) -> Result<Vec<Trade>, StrategyError>;
}

/// Mapping from strategy name to implementation, resolved once at call time.
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Empty registry. Use `Default` for the built-in strategy set.
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    pub fn register(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies
            .insert(strategy.name().to_string(), strategy);
    }

    /// Resolve a strategy by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Strategy>, StrategyError> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| StrategyError::UnknownStrategy(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SmaCrossover));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_sma_crossover() {
        let registry = StrategyRegistry::default();
        assert_eq!(registry.names(), vec!["SMA_CROSSOVER"]);
        assert!(registry.get("SMA_CROSSOVER").is_ok());
    }

    #[test]
    fn unknown_name_fails_lookup() {
        let registry = StrategyRegistry::default();
        let err = registry.get("RSI_REVERSAL").unwrap_err();
        assert!(matches!(err, StrategyError::UnknownStrategy(_)));
        assert!(err.to_string().contains("RSI_REVERSAL"));
    }
}
