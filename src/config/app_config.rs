use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::infrastructure::cache::CacheConfig;
use crate::infrastructure::cache_source::CacheSourceConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub cache_source: CacheSourceConfig,
    /// Named cache configurations
    pub caches: BTreeMap<String, CacheConfig>,
    /// Named data sources
    pub sources: BTreeMap<String, SourceSettings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings of one in-memory data source
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// JSON fixtures shaped like `{ "Alias": [record, ...] }`
    pub fixtures: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            cache_source: CacheSourceConfig::new("default"),
            caches: BTreeMap::from([("default".to_string(), CacheConfig::in_memory())]),
            sources: BTreeMap::from([("default".to_string(), SourceSettings::default())]),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Loads `config/default`, `config/local` and `APP__*` variables
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Path::new("config"))
    }

    /// Same as [`AppConfig::load`] with files looked up in `dir`
    pub fn load_from(dir: &Path) -> Result<Self, config::ConfigError> {
        let file = |name: &str| {
            config::File::with_name(&dir.join(name).to_string_lossy()).required(false)
        };

        let config = config::Config::builder()
            .add_source(file("default"))
            .add_source(file("local"))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::CacheType;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.cache_source.original().unwrap(), "default");
        assert_eq!(config.cache_source.config, "default");
        assert_eq!(config.caches["default"].cache_type, CacheType::InMemory);
        assert!(config.sources["default"].fixtures.is_none());
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("cacher-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("default.toml"),
            r#"
                [logging]
                format = "json"

                [cache_source]
                original = "orders"
                config = "short"

                [caches.short]
                type = "in_memory"
                ttl_secs = 30

                [sources.orders]
                fixtures = "fixtures/orders.json"
            "#,
        )
        .unwrap();

        let config = AppConfig::load_from(&dir).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.cache_source.original().unwrap(), "orders");
        assert_eq!(config.cache_source.config, "short");
        assert_eq!(config.caches["short"].ttl_secs, 30);
        assert_eq!(
            config.sources["orders"].fixtures,
            Some(PathBuf::from("fixtures/orders.json"))
        );
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/cacher")).unwrap();
        assert_eq!(config.cache_source.original().unwrap(), "default");
    }
}
