//! `index`: scan the library and persist the metadata index.

use anyhow::{Context, Result};
use chapterbay_core::metadata::index_path;
use chapterbay_core::{Config, MetadataCache};

pub fn run_index(config: &Config) -> Result<()> {
    let root = &config.library.root_dir;
    let cache = MetadataCache::new(root);
    let index = cache
        .rebuild()
        .with_context(|| format!("Failed to index {:?}", root))?;

    println!(
        "Indexed {} episodes in {} seasons -> {}",
        index.episode_count(),
        index.seasons.len(),
        index_path(root).display()
    );
    Ok(())
}
