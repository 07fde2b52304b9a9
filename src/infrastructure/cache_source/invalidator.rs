//! Targeted and bulk eviction of cached results

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::{DomainError, Entity, QueryDescription};
use crate::infrastructure::observability::{
    record_cache_degraded, record_invalidated_keys, DegradedOperation,
};

use super::reader::CacheSource;

/// Outcome of an invalidation call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    /// Keys that were targeted
    pub keys: Vec<String>,
    /// Entries that were present and got deleted
    pub deleted: usize,
    /// Entries whose deletion failed; they expire with their TTL
    pub failed: usize,
}

impl CacheSource {
    /// Evicts the cached result of `query`, or every result of `entity` when
    /// no query is given
    ///
    /// The entity's source is resolved again, the same way a read resolves
    /// it, so a rebound entity evicts from the slot of its current source and
    /// an unregistered binding is a configuration error. Deleting absent
    /// entries is not an error. Keys whose deletion fails stay in the map so
    /// a retry can reach them. Failing to rewrite the map fails the call;
    /// deletions already made stay made, and retrying is safe.
    #[instrument(skip(self, entity, query), fields(entity = %entity))]
    pub async fn invalidate(
        &self,
        entity: &Entity,
        query: Option<&QueryDescription>,
    ) -> Result<InvalidationReport, DomainError> {
        let resolved = self.resolve(entity).await?;
        let source_name = resolved.name.as_str();
        let alias = entity.alias();

        let keys = match query {
            Some(query) => vec![self.keys.derive(source_name, alias, query)],
            None => self.map.lookup_keys(source_name, alias).await?,
        };

        if keys.is_empty() {
            debug!(source = %source_name, "Nothing recorded to invalidate");
            return Ok(InvalidationReport::default());
        }

        let mut report = InvalidationReport::default();
        let mut evicted = Vec::with_capacity(keys.len());
        for key in &keys {
            match self.cache.delete(key).await {
                Ok(existed) => {
                    if existed {
                        report.deleted += 1;
                    }
                    evicted.push(key.clone());
                }
                Err(error) => {
                    warn!(
                        key = %key,
                        error = %error,
                        "Failed to delete cache entry, keeping it mapped"
                    );
                    record_cache_degraded(DegradedOperation::Delete);
                    report.failed += 1;
                }
            }
        }

        let unmapped = self.map.remove_keys(source_name, alias, &evicted).await?;

        info!(
            source = %source_name,
            targeted = keys.len(),
            deleted = report.deleted,
            failed = report.failed,
            unmapped,
            "Invalidated cached results"
        );
        record_invalidated_keys(source_name, alias, report.deleted);

        report.keys = keys;
        Ok(report)
    }
}
