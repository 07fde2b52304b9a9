//! Read-through decorator over the registered data sources

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::domain::{
    Cache, DomainError, Entity, InvalidationMap, KeyDeriver, QueryDescription, QueryKeyDeriver,
    ResultSet,
};
use crate::infrastructure::cache::CacheRegistry;
use crate::infrastructure::observability::{
    record_cache_degraded, record_cache_hit, record_cache_miss, record_source_read,
    DegradedOperation,
};
use crate::infrastructure::source::{ResolvedSource, SourceRegistry};

use super::config::CacheSourceConfig;
use super::map_store::InvalidationMapStore;

/// Caching decorator in front of a data source
///
/// Reads are answered from the configured cache when a result for the same
/// (source, entity, normalized query) was stored before. Otherwise the
/// resolved source is read, and its result is stored and recorded in the
/// invalidation map. Cache failures never fail a read: they are logged and
/// the read falls back to the source.
#[derive(Debug)]
pub struct CacheSource {
    pub(super) original: String,
    pub(super) cache_config: String,
    pub(super) sources: Arc<SourceRegistry>,
    pub(super) cache: Arc<dyn Cache>,
    pub(super) ttl: Duration,
    pub(super) keys: Arc<dyn KeyDeriver>,
    pub(super) map: InvalidationMapStore,
}

impl CacheSource {
    /// Builds the decorator, checking that its original source and cache exist
    pub async fn new(
        config: &CacheSourceConfig,
        sources: Arc<SourceRegistry>,
        caches: &CacheRegistry,
    ) -> Result<Self, DomainError> {
        let original = config.original()?.to_string();

        if !sources.contains(&original).await {
            return Err(DomainError::configuration(format!(
                "Original source '{}' is not registered",
                original
            )));
        }

        let handle = caches.get(&config.config)?;

        info!(
            original = %original,
            cache_config = %handle.name,
            ttl_secs = handle.ttl.as_secs(),
            "Cache source initialized"
        );

        Ok(Self {
            original,
            cache_config: handle.name,
            sources,
            map: InvalidationMapStore::new(handle.cache.clone(), handle.ttl),
            cache: handle.cache,
            ttl: handle.ttl,
            keys: Arc::new(QueryKeyDeriver::new()),
        })
    }

    /// Replaces the key deriver
    pub fn with_key_deriver(mut self, keys: Arc<dyn KeyDeriver>) -> Self {
        self.keys = keys;
        self
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn cache_config(&self) -> &str {
        &self.cache_config
    }

    /// Name of the source serving `entity`: its own binding, else the original
    pub fn source_name<'a>(&'a self, entity: &'a Entity) -> &'a str {
        entity.source.as_deref().unwrap_or(&self.original)
    }

    /// Resolves the source instance serving `entity` right now
    pub async fn resolve(&self, entity: &Entity) -> Result<ResolvedSource, DomainError> {
        self.sources.resolve(self.source_name(entity)).await
    }

    /// Key the result of `query` against `entity` is cached under
    pub fn cache_key(&self, entity: &Entity, query: &QueryDescription) -> String {
        self.keys.derive(self.source_name(entity), entity.alias(), query)
    }

    /// Reads through the cache
    ///
    /// Fails only when the source read fails, in which case nothing is
    /// written to the cache or the map.
    #[instrument(skip(self, entity, query), fields(entity = %entity))]
    pub async fn read(
        &self,
        entity: &Entity,
        query: &QueryDescription,
    ) -> Result<ResultSet, DomainError> {
        let resolved = self.resolve(entity).await?;
        let alias = entity.alias();
        let key = self.keys.derive(&resolved.name, alias, query);

        if let Some(results) = self.cached(&key).await {
            debug!(source = %resolved.name, key = %key, "Cache hit");
            record_cache_hit(&resolved.name, alias);
            return Ok(results);
        }

        debug!(source = %resolved.name, key = %key, "Cache miss, reading source");
        record_cache_miss(&resolved.name, alias);

        let results = match resolved.source.read(entity, query).await {
            Ok(results) => {
                record_source_read(&resolved.name, true);
                results
            }
            Err(error) => {
                record_source_read(&resolved.name, false);
                return Err(error);
            }
        };

        self.populate(&resolved.name, alias, &key, &results).await;

        Ok(results)
    }

    /// Cached result under `key`; unreadable entries count as misses
    async fn cached(&self, key: &str) -> Option<ResultSet> {
        let raw = match self.cache.get_raw(key).await {
            Ok(raw) => raw?,
            Err(error) => {
                warn!(key = %key, error = %error, "Cache lookup failed, falling back to source");
                record_cache_degraded(DegradedOperation::Get);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(results) => Some(results),
            Err(error) => {
                warn!(key = %key, error = %error, "Ignoring undecodable cache entry");
                record_cache_degraded(DegradedOperation::Get);
                None
            }
        }
    }

    async fn populate(&self, source_name: &str, alias: &str, key: &str, results: &ResultSet) {
        let stored = match serde_json::to_string(results) {
            Ok(raw) => self.cache.set_raw(key, &raw, self.ttl).await,
            Err(e) => Err(DomainError::internal(format!(
                "Failed to serialize results: {}",
                e
            ))),
        };

        if let Err(error) = stored {
            warn!(key = %key, error = %error, "Failed to store results");
            record_cache_degraded(DegradedOperation::Set);
            return;
        }

        if let Err(error) = self.map.register_key(source_name, alias, key).await {
            warn!(
                source = %source_name,
                entity = %alias,
                key = %key,
                error = %error,
                "Failed to record key in invalidation map"
            );
            record_cache_degraded(DegradedOperation::Map);
        }
    }

    /// Empties the whole cache configuration, invalidation map included
    pub async fn clear_all(&self) -> Result<(), DomainError> {
        self.cache.clear().await?;
        info!(cache_config = %self.cache_config, "Cache cleared");
        Ok(())
    }

    /// Snapshot of the stored invalidation map
    pub async fn invalidation_map(&self) -> Result<InvalidationMap, DomainError> {
        self.map.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheOp;
    use crate::domain::source::{CountingSource, MockDataSource};
    use crate::domain::MAP_KEY;
    use crate::infrastructure::cache_source::testing::{fixture, Fixture};
    use serde_json::json;

    fn widget_rows() -> ResultSet {
        vec![json!({"id": 1, "name": "first"}), json!({"id": 2, "name": "second"})]
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let Fixture { source, cache_source, .. } = fixture().await;
        source.set_records("Widget", widget_rows());
        let entity = Entity::new("Widget");
        let query = QueryDescription::new().with_conditions(json!({"id": 1}));

        let first = cache_source.read(&entity, &query).await.unwrap();
        source.set_records("Widget", vec![json!({"id": 3})]);
        let second = cache_source.read(&entity, &query).await.unwrap();

        assert_eq!(first, widget_rows());
        assert_eq!(second, widget_rows());
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_equivalent_queries_share_an_entry() {
        let Fixture { source, cache_source, .. } = fixture().await;
        source.set_records("Widget", widget_rows());
        let entity = Entity::new("Widget");

        cache_source.read(&entity, &QueryDescription::new()).await.unwrap();
        cache_source
            .read(
                &entity,
                &QueryDescription::from_json(r#"{"joins": [], "callbacks": true}"#).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_result_is_cached() {
        let Fixture { source, cache, cache_source, .. } = fixture().await;
        let entity = Entity::new("Widget");
        let query = QueryDescription::new();

        assert!(cache_source.read(&entity, &query).await.unwrap().is_empty());
        assert_eq!(cache.raw(&cache_source.cache_key(&entity, &query)), Some("[]".to_string()));

        source.set_records("Widget", widget_rows());
        assert!(cache_source.read(&entity, &query).await.unwrap().is_empty());
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_miss_writes_entry_with_configured_ttl_and_registers_key() {
        let Fixture { source, cache, cache_source, .. } = fixture().await;
        source.set_records("Widget", widget_rows());
        let entity = Entity::new("Widget");
        let query = QueryDescription::new().with_limit(1);

        cache_source.read(&entity, &query).await.unwrap();

        let key = cache_source.cache_key(&entity, &query);
        assert_eq!(cache.ttl_of(&key), Some(Duration::from_secs(120)));
        assert_eq!(
            cache_source.invalidation_map().await.unwrap().keys("default", "Widget"),
            &[key]
        );
    }

    #[tokio::test]
    async fn test_source_error_propagates_without_writes() {
        let Fixture { cache, cache_source, sources, .. } = fixture().await;

        let mut failing = MockDataSource::new();
        failing
            .expect_read()
            .times(1)
            .returning(|_, _| Err(DomainError::source("remote", "connection reset")));
        sources.register("remote", Arc::new(failing)).await;

        let entity = Entity::new("Widget").with_source("remote");
        let result = cache_source.read(&entity, &QueryDescription::new()).await;

        match result {
            Err(DomainError::Source { source_name, message }) => {
                assert_eq!(source_name, "remote");
                assert_eq!(message, "connection reset");
            }
            other => panic!("Expected source error, got {:?}", other),
        }
        assert!(cache.keys().is_empty());
    }

    #[tokio::test]
    async fn test_cache_lookup_failure_falls_back_to_source() {
        let Fixture { source, cache, cache_source, .. } = fixture().await;
        source.set_records("Widget", widget_rows());
        cache.fail(CacheOp::Get);

        let entity = Entity::new("Widget");
        let results = cache_source.read(&entity, &QueryDescription::new()).await.unwrap();

        assert_eq!(results, widget_rows());
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let Fixture { source, cache, cache_source, .. } = fixture().await;
        source.set_records("Widget", widget_rows());
        let entity = Entity::new("Widget");
        let query = QueryDescription::new();
        let key = cache_source.cache_key(&entity, &query);
        cache.set_raw(&key, "{not json", Duration::from_secs(60)).await.unwrap();

        let results = cache_source.read(&entity, &query).await.unwrap();

        assert_eq!(results, widget_rows());
        assert_eq!(source.call_count(), 1);
        assert_eq!(
            serde_json::from_str::<ResultSet>(&cache.raw(&key).unwrap()).unwrap(),
            widget_rows()
        );
    }

    #[tokio::test]
    async fn test_store_failure_still_returns_results() {
        let Fixture { source, cache, cache_source, .. } = fixture().await;
        source.set_records("Widget", widget_rows());
        cache.fail(CacheOp::Set);

        let results = cache_source
            .read(&Entity::new("Widget"), &QueryDescription::new())
            .await
            .unwrap();

        assert_eq!(results, widget_rows());
        assert!(cache.keys().is_empty());
    }

    #[tokio::test]
    async fn test_map_write_failure_still_returns_results() {
        let Fixture { source, cache, cache_source, .. } = fixture().await;
        source.set_records("Widget", widget_rows());
        cache.fail_key(CacheOp::Set, MAP_KEY);
        let entity = Entity::new("Widget");
        let query = QueryDescription::new();

        let results = cache_source.read(&entity, &query).await.unwrap();

        assert_eq!(results, widget_rows());
        assert!(cache.raw(&cache_source.cache_key(&entity, &query)).is_some());
        assert!(cache.raw(MAP_KEY).is_none());
    }

    #[tokio::test]
    async fn test_map_read_failure_skips_registration() {
        let Fixture { source, cache, cache_source, .. } = fixture().await;
        source.set_records("Widget", widget_rows());
        let existing = r#"{"default":{"Gadget":["default_gadget_x"]}}"#;
        cache.set_raw(MAP_KEY, existing, Duration::from_secs(60)).await.unwrap();
        cache.fail_key(CacheOp::Get, MAP_KEY);

        cache_source
            .read(&Entity::new("Widget"), &QueryDescription::new())
            .await
            .unwrap();

        assert_eq!(cache.raw(MAP_KEY), Some(existing.to_string()));
    }

    #[tokio::test]
    async fn test_entity_binding_selects_source_and_key() {
        let Fixture { source, sources, cache_source, .. } = fixture().await;
        source.set_records("Widget", widget_rows());
        let replica = Arc::new(CountingSource::new().with_records("Widget", vec![json!({"id": 9})]));
        sources.register("replica", replica.clone()).await;

        let mut entity = Entity::new("Widget");
        let query = QueryDescription::new();
        let default_key = cache_source.cache_key(&entity, &query);
        assert_eq!(cache_source.read(&entity, &query).await.unwrap(), widget_rows());

        entity.bind_source(Some("replica".to_string()));
        let replica_key = cache_source.cache_key(&entity, &query);
        assert_eq!(cache_source.read(&entity, &query).await.unwrap(), vec![json!({"id": 9})]);

        assert_ne!(default_key, replica_key);
        assert!(replica_key.starts_with("replica_widget_"));
        assert_eq!(replica.call_count(), 1);

        let map = cache_source.invalidation_map().await.unwrap();
        assert_eq!(map.keys("default", "Widget"), &[default_key]);
        assert_eq!(map.keys("replica", "Widget"), &[replica_key]);
    }

    #[tokio::test]
    async fn test_unregistered_entity_source_fails_read() {
        let Fixture { cache_source, .. } = fixture().await;

        let result = cache_source
            .read(&Entity::new("Widget").with_source("missing"), &QueryDescription::new())
            .await;

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_new_requires_original() {
        let Fixture { sources, caches, .. } = fixture().await;

        let result = CacheSource::new(&CacheSourceConfig::default(), sources, &caches).await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_new_rejects_unregistered_original() {
        let Fixture { sources, caches, .. } = fixture().await;

        let result = CacheSource::new(&CacheSourceConfig::new("missing"), sources, &caches).await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_new_rejects_unknown_cache_config() {
        let Fixture { sources, caches, .. } = fixture().await;

        let config = CacheSourceConfig::new("default").with_cache_config("nope");
        let result = CacheSource::new(&config, sources, &caches).await;

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_custom_key_deriver() {
        #[derive(Debug)]
        struct FixedKeys;

        impl KeyDeriver for FixedKeys {
            fn derive(&self, _: &str, entity_alias: &str, _: &QueryDescription) -> String {
                format!("fixed_{}", entity_alias)
            }
        }

        let Fixture { source, cache, cache_source, .. } = fixture().await;
        source.set_records("Widget", widget_rows());
        let cache_source = cache_source.with_key_deriver(Arc::new(FixedKeys));

        cache_source
            .read(&Entity::new("Widget"), &QueryDescription::new())
            .await
            .unwrap();

        assert!(cache.raw("fixed_Widget").is_some());
    }

    #[tokio::test]
    async fn test_clear_all_empties_entries_and_map() {
        let Fixture { source, cache, cache_source, .. } = fixture().await;
        source.set_records("Widget", widget_rows());
        cache_source
            .read(&Entity::new("Widget"), &QueryDescription::new())
            .await
            .unwrap();

        cache_source.clear_all().await.unwrap();

        assert!(cache.keys().is_empty());
        assert!(cache_source.invalidation_map().await.unwrap().is_empty());
    }
}
