//! `info`: per-season counts.

use anyhow::Result;
use chapterbay_core::metadata::{load, season_summaries};
use chapterbay_core::Config;

pub fn run_info(config: &Config) -> Result<()> {
    let root = &config.library.root_dir;
    let index = load(root);
    if index.is_empty() {
        println!("No metadata for {}; run `chapterbay index` first", root.display());
        return Ok(());
    }

    for season in season_summaries(&index, root) {
        let name = season.name.as_deref().unwrap_or("-");
        println!(
            "{:<12} {:>9}  {:<32} {}/{} videos",
            season.label,
            season.range.to_string(),
            name,
            season.videos,
            season.descriptions
        );
    }
    Ok(())
}
