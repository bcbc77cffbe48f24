use std::path::PathBuf;

use clap::Parser;
use pipewatch::cli::types::{Cli, Commands};

#[test]
fn test_parse_watch_defaults() {
    let cli = Cli::try_parse_from(["pipewatch", "watch"]).unwrap();

    assert!(!cli.json);
    assert!(cli.config.is_none());
    assert!(cli.log_level.is_none());
    match cli.command {
        Commands::Watch(args) => assert!(args.limit.is_none()),
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_snapshot_settle() {
    let cli = Cli::try_parse_from([
        "pipewatch",
        "--log-level",
        "debug",
        "snapshot",
        "-l",
        "4",
        "--settle-secs",
        "3",
    ])
    .unwrap();

    assert_eq!(cli.log_level.as_deref(), Some("debug"));
    match cli.command {
        Commands::Snapshot(args) => {
            assert_eq!(args.limit, Some(4));
            assert_eq!(args.settle_secs, 3);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_snapshot_settle_default() {
    let cli = Cli::try_parse_from(["pipewatch", "snapshot"]).unwrap();
    match cli.command {
        Commands::Snapshot(args) => assert_eq!(args.settle_secs, 15),
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_snapshot_task_listing_flags() {
    let cli = Cli::try_parse_from(["pipewatch", "snapshot", "--tasks", "--stage", "4"]).unwrap();
    match cli.command {
        Commands::Snapshot(args) => {
            assert!(args.tasks);
            assert_eq!(args.stage, Some(4));
        }
        _ => panic!("Wrong top-level command"),
    }

    let cli = Cli::try_parse_from(["pipewatch", "snapshot"]).unwrap();
    match cli.command {
        Commands::Snapshot(args) => {
            assert!(!args.tasks);
            assert_eq!(args.stage, None);
        }
        _ => panic!("Wrong top-level command"),
    }

    assert!(Cli::try_parse_from(["pipewatch", "snapshot", "--stage", "100"]).is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["pipewatch", "config", "--json", "-c", "ci.yaml"]).unwrap();

    assert!(cli.json);
    assert_eq!(cli.config, Some(PathBuf::from("ci.yaml")));
    assert!(matches!(cli.command, Commands::Config));
}

#[test]
fn test_invalid_limits_are_rejected() {
    assert!(Cli::try_parse_from(["pipewatch", "snapshot", "--limit", "0"]).is_err());
    assert!(Cli::try_parse_from(["pipewatch", "watch", "--limit", "many"]).is_err());
    assert!(Cli::try_parse_from(["pipewatch"]).is_err());
    assert!(Cli::try_parse_from(["pipewatch", "deploy"]).is_err());
}
