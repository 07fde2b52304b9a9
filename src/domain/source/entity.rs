use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Records as returned by a source
pub type ResultSet = Vec<Value>;

/// A logical data type a source can retrieve
///
/// `source` is the entity's own backing-source binding. When set it takes
/// precedence over the cache source's configured original source, and it may
/// be rebound between calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Entity {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Rebinds the entity to another backing source
    pub fn bind_source(&mut self, source: Option<String>) {
        self.source = source;
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}@{}", self.alias, source),
            None => write!(f, "{}", self.alias),
        }
    }
}
