//! Data layer: provider capability, per-ticker parquet cache, and the
//! gap-filling cache synchronizer.

pub mod cache;
pub mod polygon;
pub mod provider;
pub mod store;
pub mod sync;

pub use cache::{CacheMeta, CacheStatus, ParquetCache};
pub use polygon::PolygonProvider;
pub use provider::{BarProvider, DataError};
pub use store::BarStore;
pub use sync::CacheSynchronizer;
