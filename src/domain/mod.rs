//! Domain layer - Core types and collaborator contracts

pub mod cache;
pub mod error;
pub mod query;
pub mod source;

pub use cache::{Cache, CacheExt, InvalidationMap, KeyDeriver, QueryKeyDeriver, MAP_KEY};
pub use error::DomainError;
pub use query::{NormalizedQuery, QueryDescription};
pub use source::{DataSource, Entity, ResultSet};
