//! Cache infrastructure - Cache backends and named configurations

mod factory;
mod in_memory;
mod redis;
mod registry;

pub use factory::{CacheConfig, CacheFactory, CacheType};
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use redis::{RedisCache, RedisCacheConfig};
pub use registry::{CacheHandle, CacheRegistry};
