//! `clear`: crash recovery.

use anyhow::Result;
use chapterbay_core::session::recover_stale_state;
use chapterbay_core::Config;

pub fn run_clear(config: &Config) -> Result<()> {
    let cleanup = recover_stale_state(&config.session.work_root(), &config.session.snapshot_path());
    println!(
        "Snapshot {}, {} work directories removed",
        if cleanup.snapshot_removed { "removed" } else { "not present" },
        cleanup.work_dirs_removed
    );
    Ok(())
}
