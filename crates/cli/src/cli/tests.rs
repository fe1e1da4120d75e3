//! CLI parse tests.

use super::{config_path, Cli, CliCommand};
use chapterbay_core::ChapterRange;
use clap::Parser;
use std::path::PathBuf;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn test_status_parses_range() {
    let cli = parse(&["chapterbay", "status", "8–11"]);
    match cli.command {
        CliCommand::Status { range } => assert_eq!(Some(range), ChapterRange::new(8, 11)),
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_status_rejects_garbage_range() {
    assert!(Cli::try_parse_from(["chapterbay", "status", "soon"]).is_err());
}

#[test]
fn test_download_args() {
    let cli = parse(&[
        "chapterbay",
        "download",
        "--jobs",
        "2",
        "--force-range",
        "100-102",
        "12:[One Pace] Special [720p]",
    ]);
    match cli.command {
        CliCommand::Download {
            releases,
            jobs_file,
            force_range,
            jobs,
        } => {
            assert_eq!(releases, vec!["12:[One Pace] Special [720p]".to_string()]);
            assert!(jobs_file.is_none());
            assert_eq!(force_range, ChapterRange::new(100, 102));
            assert_eq!(jobs, Some(2));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&["chapterbay", "progress", "--json", "--debug", "--config", "/etc/cb.toml"]);
    assert!(cli.debug);
    assert!(!cli.log_json);
    assert_eq!(cli.config, Some(PathBuf::from("/etc/cb.toml")));
    assert!(matches!(cli.command, CliCommand::Progress { json: true }));
}

#[test]
fn test_place_requires_range() {
    assert!(Cli::try_parse_from(["chapterbay", "place", "video.mkv"]).is_err());
    let cli = parse(&["chapterbay", "place", "video.mkv", "--range", "150"]);
    match cli.command {
        CliCommand::Place { file, range } => {
            assert_eq!(file, PathBuf::from("video.mkv"));
            assert_eq!(range.to_string(), "150-150");
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_config_flag_wins() {
    assert_eq!(
        config_path(Some(PathBuf::from("custom.toml"))),
        PathBuf::from("custom.toml")
    );
}
