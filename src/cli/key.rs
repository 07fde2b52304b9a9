//! Key command - prints the cache key of a query

use std::path::Path;

use crate::domain::{KeyDeriver, QueryKeyDeriver};

use super::{bootstrap, TargetArgs};

/// Derives the key offline; no cache or source is contacted
pub async fn run(config_dir: &Path, args: TargetArgs) -> anyhow::Result<()> {
    let config = bootstrap(config_dir)?;
    let entity = args.entity();

    let source_name = match entity.source.as_deref() {
        Some(source) => source,
        None => config.cache_source.original()?,
    };

    let key = QueryKeyDeriver::new().derive(source_name, entity.alias(), &args.query_or_default()?);
    println!("{}", key);

    Ok(())
}
