//! Cacher
//!
//! A read-through caching decorator for data sources:
//! - Deterministic cache keys derived from normalized query descriptions
//! - In-memory (moka) and Redis cache backends behind one `Cache` trait
//! - An invalidation map for evicting one query or a whole entity

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use domain::DataSource;
use infrastructure::{
    cache::CacheRegistry,
    cache_source::CacheSource,
    source::{InMemoryDataSource, SourceRegistry},
};
use tracing::info;

/// Builds the configured sources, caches and the cache source over them
pub async fn create_cache_source(config: &AppConfig) -> anyhow::Result<CacheSource> {
    let sources = Arc::new(SourceRegistry::new());

    for (name, settings) in &config.sources {
        let source = match &settings.fixtures {
            Some(path) => InMemoryDataSource::from_fixture_file(name.clone(), path).await?,
            None => InMemoryDataSource::new(name.clone()),
        };
        info!(source = %name, fixtures = ?settings.fixtures, "Data source registered");

        let source: Arc<dyn DataSource> = Arc::new(source);
        sources.register(name.clone(), source).await;
    }

    let caches = CacheRegistry::from_configs(&config.caches).await?;

    Ok(CacheSource::new(&config.cache_source, sources, &caches).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceSettings;
    use crate::domain::{Entity, QueryDescription};
    use crate::infrastructure::cache::CacheConfig;

    #[tokio::test]
    async fn test_create_from_defaults() {
        let cache_source = create_cache_source(&AppConfig::default()).await.unwrap();

        assert_eq!(cache_source.original(), "default");
        let rows = cache_source
            .read(&Entity::new("Widget"), &QueryDescription::new())
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_unknown_cache_config() {
        let mut config = AppConfig::default();
        config.cache_source.config = "missing".to_string();

        let error = create_cache_source(&config).await.unwrap_err();
        assert!(error.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_create_with_missing_fixtures() {
        let mut config = AppConfig::default();
        config.sources.insert(
            "default".to_string(),
            SourceSettings {
                fixtures: Some("/nonexistent/fixtures.json".into()),
            },
        );

        assert!(create_cache_source(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_create_with_zero_ttl() {
        let mut config = AppConfig::default();
        config.caches.insert(
            "default".to_string(),
            CacheConfig::in_memory().with_ttl(std::time::Duration::ZERO),
        );

        assert!(create_cache_source(&config).await.is_err());
    }
}
