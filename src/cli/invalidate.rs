//! Invalidate command - evicts cached results

use std::path::Path;

use super::{bootstrap, TargetArgs};

/// Without `--query` every recorded result of the entity is evicted
pub async fn run(config_dir: &Path, args: TargetArgs) -> anyhow::Result<()> {
    let config = bootstrap(config_dir)?;
    let cache_source = crate::create_cache_source(&config).await?;

    let query = args.query()?;
    let report = cache_source.invalidate(&args.entity(), query.as_ref()).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
