use async_trait::async_trait;

use super::{Entity, ResultSet};
use crate::domain::query::QueryDescription;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Trait for retrieval backends (database, API, file store, ...)
///
/// Failures should be reported as [`DomainError::Source`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Reads the records of `entity` matching `query`
    async fn read(
        &self,
        entity: &Entity,
        query: &QueryDescription,
    ) -> Result<ResultSet, DomainError>;
}
