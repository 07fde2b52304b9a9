//! Invalidation map persisted under the reserved `map` key

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{Cache, DomainError, InvalidationMap, MAP_KEY};
use crate::infrastructure::observability::{record_cache_degraded, DegradedOperation};

/// Reads and rewrites the invalidation map of one cache configuration
///
/// Every mutation is a full read, an in-memory edit and a full write-back.
/// Mutations issued through the same store are serialized; two stores over
/// the same backend (separate processes) can still overwrite each other.
#[derive(Debug)]
pub struct InvalidationMapStore {
    cache: Arc<dyn Cache>,
    ttl: Duration,
    lock: Mutex<()>,
}

impl InvalidationMapStore {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self {
            cache,
            ttl,
            lock: Mutex::new(()),
        }
    }

    /// Current map; absent or unreadable contents count as an empty map
    pub async fn load(&self) -> Result<InvalidationMap, DomainError> {
        let Some(raw) = self.cache.get_raw(MAP_KEY).await? else {
            return Ok(InvalidationMap::new());
        };

        match InvalidationMap::from_json(&raw) {
            Ok(map) => Ok(map),
            Err(error) => {
                warn!(error = %error, "Discarding corrupt invalidation map");
                record_cache_degraded(DegradedOperation::Map);
                Ok(InvalidationMap::new())
            }
        }
    }

    async fn store(&self, map: &InvalidationMap) -> Result<(), DomainError> {
        self.cache.set_raw(MAP_KEY, &map.to_json()?, self.ttl).await
    }

    /// Records `key` under `(source_name, entity_alias)`
    pub async fn register_key(
        &self,
        source_name: &str,
        entity_alias: &str,
        key: &str,
    ) -> Result<(), DomainError> {
        let _guard = self.lock.lock().await;

        let mut map = self.load().await?;
        if !map.insert(source_name, entity_alias, key) {
            debug!(source = %source_name, entity = %entity_alias, key = %key, "Key already mapped");
        }

        // written back even when unchanged so the map's TTL keeps pace with its entries
        self.store(&map).await
    }

    pub async fn lookup_keys(
        &self,
        source_name: &str,
        entity_alias: &str,
    ) -> Result<Vec<String>, DomainError> {
        Ok(self.load().await?.keys(source_name, entity_alias).to_vec())
    }

    /// Removes `keys` from the slot, returning how many were recorded
    pub async fn remove_keys(
        &self,
        source_name: &str,
        entity_alias: &str,
        keys: &[String],
    ) -> Result<usize, DomainError> {
        let _guard = self.lock.lock().await;

        let mut map = self.load().await?;
        let removed = map.remove(source_name, entity_alias, keys);
        if removed > 0 {
            self.store(&map).await?;
        }

        Ok(removed)
    }
}
