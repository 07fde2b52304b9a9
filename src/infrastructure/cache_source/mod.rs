//! Read-through caching decorator
//!
//! [`CacheSource`] sits in front of the registered data sources. Results are
//! cached per (source, entity, normalized query) and every populated key is
//! recorded in an invalidation map stored under [`crate::domain::MAP_KEY`] in
//! the same cache, which is what [`CacheSource::invalidate`] evicts from.
//!
//! Map mutations made through one `CacheSource` are serialized. Separate
//! instances over a shared backend are not coordinated: concurrent rewrites
//! may drop a freshly registered key or resurrect an evicted one.

mod config;
mod invalidator;
mod map_store;
mod reader;

pub use config::CacheSourceConfig;
pub use invalidator::InvalidationReport;
pub use map_store::InvalidationMapStore;
pub use reader::CacheSource;
