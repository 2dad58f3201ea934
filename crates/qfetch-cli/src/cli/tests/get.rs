//! Tests for the get subcommand.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_get_defaults() {
    match parse(&["qfetch", "get", "https://example.com/ep1.mp3"]) {
        CliCommand::Get {
            urls,
            output_dir,
            jobs,
            timeout,
            checksum,
        } => {
            assert_eq!(urls, vec!["https://example.com/ep1.mp3"]);
            assert!(output_dir.is_none());
            assert!(jobs.is_none());
            assert!(timeout.is_none());
            assert!(!checksum);
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_many_with_options() {
    match parse(&[
        "qfetch",
        "get",
        "https://example.com/a",
        "https://example.com/b",
        "-o",
        "/tmp/out",
        "--jobs",
        "4",
        "--timeout",
        "30",
        "--checksum",
    ]) {
        CliCommand::Get {
            urls,
            output_dir,
            jobs,
            timeout,
            checksum,
        } => {
            assert_eq!(urls.len(), 2);
            assert_eq!(output_dir.as_deref(), Some(std::path::Path::new("/tmp/out")));
            assert_eq!(jobs, Some(4));
            assert_eq!(timeout, Some(30));
            assert!(checksum);
        }
        _ => panic!("expected Get with options"),
    }
}

#[test]
fn cli_parse_get_requires_url() {
    assert!(Cli::try_parse_from(["qfetch", "get"]).is_err());
}

#[test]
fn cli_parse_get_rejects_bad_jobs() {
    assert!(Cli::try_parse_from(["qfetch", "get", "https://x/", "-j", "many"]).is_err());
}
