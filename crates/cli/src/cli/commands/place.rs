//! `place <file> --range`: manual placement.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chapterbay_core::metadata::load;
use chapterbay_core::{ChapterRange, Config, FsPlacer, Placer};

pub async fn run_place(config: &Config, file: &Path, range: &ChapterRange) -> Result<()> {
    let root = &config.library.root_dir;
    let placer = FsPlacer::new(root, config.placer.clone());
    placer
        .validate()
        .await
        .with_context(|| format!("Library root {:?} is not usable", root))?;

    let index = load(root);
    let placed = placer
        .place(file, &index, range)
        .await
        .with_context(|| format!("Failed to place {:?}", file))?;

    match placed {
        Some(outcome) => {
            println!("{}", outcome.summary);
            Ok(())
        }
        None => bail!("{:?} does not exist", file),
    }
}
