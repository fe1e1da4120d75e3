//! Turning command-line input into release jobs.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chapterbay_core::{ChapterRange, ReleaseJob};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct JobsFile {
    #[serde(default)]
    jobs: Vec<ReleaseJob>,
}

/// Parses `<transfer id>:<release title>`.
pub fn parse_release_arg(arg: &str) -> Result<ReleaseJob> {
    let Some((id, title)) = arg.split_once(':') else {
        bail!("Expected <transfer id>:<release title>, got {:?}", arg);
    };
    let id: u64 = id
        .trim()
        .parse()
        .with_context(|| format!("Invalid transfer id in {:?}", arg))?;
    let title = title.trim();
    if title.is_empty() {
        bail!("Missing release title in {:?}", arg);
    }
    Ok(ReleaseJob::from_release_title(id, title))
}

pub fn load_jobs_file(path: &Path) -> Result<Vec<ReleaseJob>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read jobs file {:?}", path))?;
    let file: JobsFile =
        toml::from_str(&content).with_context(|| format!("Failed to parse jobs file {:?}", path))?;
    Ok(file.jobs)
}

/// Arguments first, then the jobs file. Duplicate transfer ids are rejected.
pub fn collect_jobs(
    releases: &[String],
    jobs_file: Option<&Path>,
    force_range: Option<ChapterRange>,
) -> Result<Vec<ReleaseJob>> {
    let mut jobs = releases
        .iter()
        .map(|arg| parse_release_arg(arg))
        .collect::<Result<Vec<_>>>()?;
    if let Some(path) = jobs_file {
        jobs.extend(load_jobs_file(path)?);
    }

    if jobs.is_empty() {
        bail!("Nothing to download: pass releases or --jobs-file");
    }

    let mut seen = std::collections::HashSet::new();
    for job in &jobs {
        if !seen.insert(job.transfer_id) {
            bail!("Transfer id {} listed more than once", job.transfer_id);
        }
    }

    if let Some(range) = force_range {
        if jobs.len() != 1 {
            bail!("--force-range applies to a single release, got {}", jobs.len());
        }
        jobs = jobs.into_iter().map(|job| job.with_chapter_range(range)).collect();
    }

    Ok(jobs)
}
