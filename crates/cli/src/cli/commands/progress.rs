//! `progress`: read the snapshot written by a running session.

use anyhow::{Context, Result};
use chapterbay_core::registry::read_snapshot;
use chapterbay_core::Config;

pub fn run_progress(config: &Config, json: bool) -> Result<()> {
    let path = config.session.snapshot_path();
    let records = read_snapshot(&path)
        .with_context(|| format!("Failed to read progress snapshot {:?}", path))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No downloads in progress");
        return Ok(());
    }

    for record in &records {
        println!(
            "{:>8}  {:<16} {:>5.1}%  {}  {}",
            record.transfer_id,
            record.status.as_str(),
            record.progress() * 100.0,
            record.title,
            record.message
        );
    }
    Ok(())
}
