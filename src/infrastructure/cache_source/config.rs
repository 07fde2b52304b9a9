use serde::Deserialize;

use crate::domain::DomainError;

/// Construction settings of a [`super::CacheSource`]
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSourceConfig {
    /// Name of the original source (required)
    #[serde(default)]
    pub original: Option<String>,
    /// Name of the cache configuration to store results in
    #[serde(default = "default_cache_config")]
    pub config: String,
}

fn default_cache_config() -> String {
    "default".to_string()
}

impl Default for CacheSourceConfig {
    fn default() -> Self {
        Self {
            original: None,
            config: default_cache_config(),
        }
    }
}

impl CacheSourceConfig {
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            original: Some(original.into()),
            ..Default::default()
        }
    }

    pub fn with_cache_config(mut self, config: impl Into<String>) -> Self {
        self.config = config.into();
        self
    }

    /// Name of the original source, failing when it was never set
    pub fn original(&self) -> Result<&str, DomainError> {
        self.original
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| DomainError::configuration("Missing name of original source"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheSourceConfig::default();
        assert_eq!(config.config, "default");
        assert!(config.original().is_err());
    }

    #[test]
    fn test_blank_original_is_missing() {
        let config = CacheSourceConfig::new("  ");
        assert!(config.original().unwrap_err().is_configuration());
    }

    #[test]
    fn test_deserialize_fills_default_config() {
        let config: CacheSourceConfig = serde_json::from_str(r#"{"original": "default"}"#).unwrap();

        assert_eq!(config.original().unwrap(), "default");
        assert_eq!(config.config, "default");
    }

    #[test]
    fn test_with_cache_config() {
        let config = CacheSourceConfig::new("default").with_cache_config("cacheTest");
        assert_eq!(config.config, "cacheTest");
    }
}
