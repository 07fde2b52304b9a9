//! Infrastructure layer - Cache backends, sources and the caching decorator

pub mod cache;
pub mod cache_source;
pub mod logging;
pub mod observability;
pub mod source;
