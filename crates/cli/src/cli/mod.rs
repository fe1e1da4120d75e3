//! Command-line surface of chapterbay.

mod commands;
mod jobs;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chapterbay_core::{load_config_or_default, validate_config, ChapterRange, Config};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use crate::logging;
use commands::{run_clear, run_download, run_index, run_info, run_place, run_progress, run_status};

/// Environment variable naming the config file when `--config` is absent.
const CONFIG_ENV: &str = "CHAPTERBAY_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "chapterbay.toml";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "chapterbay", version)]
#[command(about = "Download chapter-range releases and file them into a season library", long_about = None)]
pub struct Cli {
    /// Configuration file (default: $CHAPTERBAY_CONFIG or ./chapterbay.toml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Scan the library for episode descriptions and save the metadata index.
    Index,

    /// Show per-season video and description counts.
    Info,

    /// Report whether a chapter range has metadata and videos on disk.
    Status {
        /// Chapter range such as `8-11` or `150`.
        range: ChapterRange,
    },

    /// Download releases and place them into the library.
    Download {
        /// Releases as `<transfer id>:<release title>`.
        releases: Vec<String>,

        /// TOML file with a `[[jobs]]` array.
        #[arg(long, value_name = "PATH")]
        jobs_file: Option<PathBuf>,

        /// Place the (single) release under this range instead of the parsed one.
        #[arg(long, value_name = "RANGE")]
        force_range: Option<ChapterRange>,

        /// Override `session.max_concurrent_jobs`.
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Place a local video file as if it had been downloaded for a range.
    Place {
        /// Video file to move into the library.
        file: PathBuf,

        /// Chapter range the file covers.
        #[arg(long)]
        range: ChapterRange,
    },

    /// Print the progress snapshot of a running session.
    Progress {
        /// Print raw JSON records.
        #[arg(long)]
        json: bool,
    },

    /// Remove the progress snapshot and leftover work directories.
    Clear,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        logging::init_logging(cli.debug, cli.log_json)?;

        let config_path = config_path(cli.config);
        info!("Loading configuration from {:?}", config_path);
        let config = load_config_or_default(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?;
        validate_config(&config).context("Configuration validation failed")?;
        debug!("Loaded config: {:?}", config);

        cli.command.run(&config).await
    }

    async fn run(self, config: &Config) -> Result<()> {
        match self {
            CliCommand::Index => run_index(config),
            CliCommand::Info => run_info(config),
            CliCommand::Status { range } => run_status(config, &range),
            CliCommand::Download {
                releases,
                jobs_file,
                force_range,
                jobs,
            } => {
                let batch = jobs::collect_jobs(&releases, jobs_file.as_deref(), force_range)?;
                run_download(config, batch, jobs).await
            }
            CliCommand::Place { file, range } => run_place(config, &file, &range).await,
            CliCommand::Progress { json } => run_progress(config, json),
            CliCommand::Clear => run_clear(config),
        }
    }
}

fn config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
mod tests;
