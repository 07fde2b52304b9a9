//! Data source registry - resolves source names to instances

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{DataSource, DomainError};

/// A source instance together with the name it was resolved under
#[derive(Clone)]
pub struct ResolvedSource {
    pub name: String,
    pub source: Arc<dyn DataSource>,
}

impl fmt::Debug for ResolvedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSource")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Registry of named data sources
pub struct SourceRegistry {
    sources: RwLock<HashMap<String, Arc<dyn DataSource>>>,
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry").finish_non_exhaustive()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// Registers (or replaces) the source served under `name`
    pub async fn register(&self, name: impl Into<String>, source: Arc<dyn DataSource>) {
        self.sources.write().await.insert(name.into(), source);
    }

    pub async fn unregister(&self, name: &str) -> Option<Arc<dyn DataSource>> {
        self.sources.write().await.remove(name)
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.sources.read().await.contains_key(name)
    }

    /// Resolves `name`, failing with a configuration error when nothing is registered
    pub async fn resolve(&self, name: &str) -> Result<ResolvedSource, DomainError> {
        let source = self.sources.read().await.get(name).cloned().ok_or_else(|| {
            DomainError::configuration(format!("Data source '{}' is not registered", name))
        })?;

        Ok(ResolvedSource {
            name: name.to_string(),
            source,
        })
    }

    /// Registered names, sorted
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
