//! Index from (source, entity) to the cache keys populated for it

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Reserved cache key the map is stored under
pub const MAP_KEY: &str = "map";

/// `map[source_name][entity_alias] -> keys`
///
/// Key lists never hold duplicates. Slots that become empty are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvalidationMap {
    sources: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl InvalidationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a stored map, rejecting anything not shaped like one
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        serde_json::from_str(raw).map_err(|e| DomainError::map_corruption(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(self)
            .map_err(|e| DomainError::internal(format!("Failed to serialize map: {}", e)))
    }

    /// Adds `key` to the slot, returning false when it was already recorded
    pub fn insert(&mut self, source_name: &str, entity_alias: &str, key: &str) -> bool {
        let keys = self
            .sources
            .entry(source_name.to_string())
            .or_default()
            .entry(entity_alias.to_string())
            .or_default();

        if keys.iter().any(|k| k == key) {
            return false;
        }

        keys.push(key.to_string());
        true
    }

    /// Keys recorded for the slot, empty when none
    pub fn keys(&self, source_name: &str, entity_alias: &str) -> &[String] {
        self.sources
            .get(source_name)
            .and_then(|entities| entities.get(entity_alias))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Removes the given keys from the slot, returning how many were present
    pub fn remove(&mut self, source_name: &str, entity_alias: &str, keys: &[String]) -> usize {
        let Some(entities) = self.sources.get_mut(source_name) else {
            return 0;
        };
        let Some(recorded) = entities.get_mut(entity_alias) else {
            return 0;
        };

        let before = recorded.len();
        recorded.retain(|k| !keys.contains(k));
        let removed = before - recorded.len();

        if recorded.is_empty() {
            entities.remove(entity_alias);
        }
        if entities.is_empty() {
            self.sources.remove(source_name);
        }

        removed
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Total number of keys across all slots
    pub fn len(&self) -> usize {
        self.sources
            .values()
            .flat_map(|entities| entities.values())
            .map(Vec::len)
            .sum()
    }
}
