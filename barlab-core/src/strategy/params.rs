//! Strategy parameter maps and boundary validation.
//!
//! Parameters travel as string-keyed maps because both the sweep grid and
//! the CLI build them dynamically; each strategy validates the map against
//! its allowed-key set eagerly and converts it to a typed config.

use super::StrategyError;
use std::collections::BTreeMap;

/// String-keyed strategy parameters. BTreeMap so serialized results list
/// parameters in a stable order.
pub type ParamMap = BTreeMap<String, usize>;

/// Reject any key outside the allowed set, naming the offenders.
pub fn validate_params(params: &ParamMap, allowed: &[&str]) -> Result<(), StrategyError> {
    let invalid: Vec<&str> = params
        .keys()
        .map(String::as_str)
        .filter(|k| !allowed.contains(k))
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(StrategyError::InvalidParameters(format!(
            "unrecognized keys: {invalid:?}"
        )))
    }
}

/// Named parameter with a default.
pub fn param_or(params: &ParamMap, name: &str, default: usize) -> usize {
    params.get(name).copied().unwrap_or(default)
}
