//! Tests for bootstrap, status, provenance, reset and the global --root.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use palab_core::bootstrap::AssetKind;
use std::path::PathBuf;

#[test]
fn cli_parse_bootstrap() {
    match parse(&["palab", "bootstrap"]) {
        CliCommand::Bootstrap => {}
        other => panic!("expected Bootstrap, got {other:?}"),
    }
}

#[test]
fn cli_parse_status_defaults_to_table() {
    match parse(&["palab", "status"]) {
        CliCommand::Status { json } => assert!(!json),
        other => panic!("expected Status, got {other:?}"),
    }
}

#[test]
fn cli_parse_status_json() {
    match parse(&["palab", "status", "--json"]) {
        CliCommand::Status { json } => assert!(json),
        other => panic!("expected Status, got {other:?}"),
    }
}

#[test]
fn cli_parse_provenance() {
    match parse(&["palab", "provenance"]) {
        CliCommand::Provenance { json } => assert!(!json),
        other => panic!("expected Provenance, got {other:?}"),
    }
}

#[test]
fn cli_parse_reset_kinds() {
    let cases = [
        ("text", AssetKind::Text),
        ("asr", AssetKind::Asr),
        ("speech", AssetKind::Asr),
        ("tts", AssetKind::Tts),
    ];
    for (arg, kind) in cases {
        match parse(&["palab", "reset", arg]) {
            CliCommand::Reset { kind: parsed } => assert_eq!(parsed, kind),
            other => panic!("expected Reset, got {other:?}"),
        }
    }
}

#[test]
fn cli_parse_reset_rejects_unknown_kind() {
    assert!(Cli::try_parse_from(["palab", "reset", "video"]).is_err());
}

#[test]
fn cli_parse_global_root_before_and_after_subcommand() {
    let cli = Cli::try_parse_from(["palab", "--root", "/srv/lab", "status"]).unwrap();
    assert_eq!(cli.root, Some(PathBuf::from("/srv/lab")));

    let cli = Cli::try_parse_from(["palab", "bootstrap", "--root", "/data"]).unwrap();
    assert_eq!(cli.root, Some(PathBuf::from("/data")));
    assert!(matches!(cli.command, CliCommand::Bootstrap));
}

#[test]
fn cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["palab"]).is_err());
}
