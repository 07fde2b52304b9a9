//! Read command - reads through the cache

use std::path::Path;

use tracing::info;

use super::{bootstrap, TargetArgs};

pub async fn run(config_dir: &Path, args: TargetArgs) -> anyhow::Result<()> {
    let config = bootstrap(config_dir)?;
    let cache_source = crate::create_cache_source(&config).await?;

    let entity = args.entity();
    let query = args.query_or_default()?;

    let rows = cache_source.read(&entity, &query).await?;
    info!(entity = %entity, rows = rows.len(), "Read completed");

    println!("{}", serde_json::to_string_pretty(&rows)?);

    Ok(())
}
