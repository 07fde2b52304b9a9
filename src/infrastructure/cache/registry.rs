//! Named cache configurations

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

use super::factory::{CacheConfig, CacheFactory};

/// A configured cache together with the TTL its entries are written with
#[derive(Debug, Clone)]
pub struct CacheHandle {
    pub name: String,
    pub cache: Arc<dyn Cache>,
    pub ttl: Duration,
}

/// Registry of cache configurations by name
#[derive(Debug, Default)]
pub struct CacheRegistry {
    caches: HashMap<String, CacheHandle>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds every configured cache
    pub async fn from_configs(
        configs: &BTreeMap<String, CacheConfig>,
    ) -> Result<Self, DomainError> {
        let factory = CacheFactory::new();
        let mut registry = Self::new();

        for (name, config) in configs {
            let cache = factory.create(config).await?;
            info!(
                cache = %name,
                cache_type = %config.cache_type,
                ttl_secs = config.ttl_secs,
                "Cache configured"
            );
            registry.register(name.clone(), cache, config.ttl());
        }

        Ok(registry)
    }

    /// Registers (or replaces) a cache under `name`
    pub fn register(&mut self, name: impl Into<String>, cache: Arc<dyn Cache>, ttl: Duration) {
        let name = name.into();
        self.caches.insert(name.clone(), CacheHandle { name, cache, ttl });
    }

    /// Looks up a cache configuration; an unknown name is a configuration error
    pub fn get(&self, name: &str) -> Result<CacheHandle, DomainError> {
        self.caches.get(name).cloned().ok_or_else(|| {
            DomainError::configuration(format!("Cache config '{}' not configured", name))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    /// Configured names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.keys().cloned().collect();
        names.sort();
        names
    }
}
