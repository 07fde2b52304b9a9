//! CLI module for cacher
//!
//! Provides subcommands to drive a configured cache source:
//! - `key`: print the cache key of a query
//! - `read`: read through the cache
//! - `invalidate`: evict one query or a whole entity
//! - `map`: print the invalidation map
//! - `clear`: empty the cache configuration

pub mod clear;
pub mod invalidate;
pub mod key;
pub mod map;
pub mod read;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;
use crate::domain::{Entity, QueryDescription};
use crate::infrastructure::logging;

/// Cacher - read-through caching in front of data sources
#[derive(Parser)]
#[command(name = "cacher")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `default.*` and `local.*` config files
    #[arg(long, global = true, default_value = "config")]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the cache key of a query without touching any backend
    Key(TargetArgs),

    /// Read through the cache and print the results as JSON
    Read(TargetArgs),

    /// Evict the cached result of a query, or every result of the entity
    Invalidate(TargetArgs),

    /// Print the stored invalidation map
    Map,

    /// Remove every entry of the configured cache
    Clear,
}

/// Entity and query a command works on
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Entity alias, e.g. `Widget`
    #[arg(long)]
    pub entity: String,

    /// Source the entity is bound to (defaults to the original source)
    #[arg(long)]
    pub source: Option<String>,

    /// Query description as JSON, e.g. '{"conditions": {"id": 1}}'
    #[arg(long)]
    pub query: Option<String>,
}

impl TargetArgs {
    pub fn entity(&self) -> Entity {
        let mut entity = Entity::new(self.entity.clone());
        entity.bind_source(self.source.clone());
        entity
    }

    /// The given query, if any
    pub fn query(&self) -> anyhow::Result<Option<QueryDescription>> {
        Ok(self
            .query
            .as_deref()
            .map(QueryDescription::from_json)
            .transpose()?)
    }

    /// The given query, the empty query otherwise
    pub fn query_or_default(&self) -> anyhow::Result<QueryDescription> {
        Ok(self.query()?.unwrap_or_default())
    }
}

/// Loads `.env` and the configuration, then installs logging
pub fn bootstrap(config_dir: &Path) -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load_from(config_dir)
        .with_context(|| format!("Failed to load configuration from {}", config_dir.display()))?;
    logging::init_logging(&config.logging);

    Ok(config)
}
