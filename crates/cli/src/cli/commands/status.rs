//! `status <range>`: what the library has for one range.

use anyhow::Result;
use chapterbay_core::metadata::{have_metadata, load, video_status};
use chapterbay_core::{ChapterRange, Config};

pub fn run_status(config: &Config, range: &ChapterRange) -> Result<()> {
    let root = &config.library.root_dir;
    let index = load(root);

    let metadata = have_metadata(&index, &range.to_string());
    let videos = video_status(&index, root, range);

    println!(
        "{range}: metadata {}, videos {} ({})",
        if metadata { "yes" } else { "no" },
        videos.as_str(),
        videos.code()
    );
    Ok(())
}
