//! Source domain - Entities and the retrieval backends that serve them

mod entity;
mod provider;

pub use entity::{Entity, ResultSet};
pub use provider::DataSource;

#[cfg(test)]
pub use provider::mock::CountingSource;
#[cfg(test)]
pub use provider::MockDataSource;
