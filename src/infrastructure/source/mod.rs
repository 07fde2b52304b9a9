//! Source infrastructure - Source registry and bundled source implementations

mod in_memory;
mod registry;

pub use in_memory::InMemoryDataSource;
pub use registry::{ResolvedSource, SourceRegistry};
