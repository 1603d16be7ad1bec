//! barlab runner — parameter-space search on top of `barlab-core`.
//!
//! This crate provides:
//! - Grid generation over SMA window pairs (`long > short` by construction)
//! - Parallel evaluation on a fixed-size rayon worker pool, first error
//!   aborting the batch
//! - CSV export of sweep results for the charting collaborator

pub mod export;
pub mod sweep;

pub use export::export_csv;
pub use sweep::{search, ParamGrid, SweepError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn sweep_types_are_send_sync() {
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
        assert_send::<SweepError>();
        assert_sync::<SweepError>();
    }
}
