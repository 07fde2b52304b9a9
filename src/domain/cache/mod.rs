//! Cache domain - Caching abstraction, key derivation and the invalidation map

mod invalidation_map;
mod key;
mod repository;

pub use invalidation_map::{InvalidationMap, MAP_KEY};
pub use key::{underscore, KeyDeriver, QueryKeyDeriver};
pub use repository::{Cache, CacheExt};

#[cfg(test)]
pub use repository::mock::{CacheOp, MockCache};
