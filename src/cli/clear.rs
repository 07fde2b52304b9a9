//! Clear command - empties the configured cache

use std::path::Path;

use super::bootstrap;

pub async fn run(config_dir: &Path) -> anyhow::Result<()> {
    let config = bootstrap(config_dir)?;
    let cache_source = crate::create_cache_source(&config).await?;

    cache_source.clear_all().await?;
    println!("Cleared cache '{}'", cache_source.cache_config());

    Ok(())
}
