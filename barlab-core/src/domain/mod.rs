//! Domain types for barlab

pub mod bar;
pub mod performance;
pub mod trade;

pub use bar::Bar;
pub use performance::{round3, Performance};
pub use trade::{Action, Trade};

/// Ticker type alias
pub type Ticker = String;
