//! Map command - prints the invalidation map

use std::path::Path;

use super::bootstrap;

pub async fn run(config_dir: &Path) -> anyhow::Result<()> {
    let config = bootstrap(config_dir)?;
    let cache_source = crate::create_cache_source(&config).await?;

    let map = cache_source.invalidation_map().await?;
    println!("{}", serde_json::to_string_pretty(&map)?);

    Ok(())
}
