//! Integration tests for basic CLI behavior.
//!
//! Tests that the binary exists, accepts standard flags, and each subcommand
//! responds to `--help` with appropriate text. Nothing here touches the network.

#![allow(deprecated)] // cargo_bin deprecation: replacement not yet stable

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: get a Command for the `reel` binary.
fn reel() -> Command {
    Command::cargo_bin("reel").expect("binary 'reel' should be built")
}

// ─── Top-level flags ─────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    reel()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: reel"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("sources"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn version_flag_shows_semver() {
    reel()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^reel \d+\.\d+\.\d+\n$").unwrap());
}

#[test]
fn no_args_shows_error_and_usage() {
    reel()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: reel"));
}

#[test]
fn invalid_subcommand_fails() {
    reel()
        .arg("this-is-not-a-real-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ─── Subcommand help ─────────────────────────────────────────────────────────

#[test]
fn search_help() {
    reel()
        .args(["search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Search the provider's catalog"))
        .stdout(predicate::str::contains("<QUERY>"))
        .stdout(predicate::str::contains("--page"));
}

#[test]
fn info_help() {
    reel()
        .args(["info", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Show metadata"))
        .stdout(predicate::str::contains("<FILM_ID>"))
        .stdout(predicate::str::contains("--tv"));
}

#[test]
fn sources_help() {
    reel()
        .args(["sources", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolve streams"))
        .stdout(predicate::str::contains("--season"))
        .stdout(predicate::str::contains("--episode"))
        .stdout(predicate::str::contains("--json"));
}

// ─── Argument validation ─────────────────────────────────────────────────────

#[test]
fn search_missing_query_fails() {
    reel()
        .arg("search")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<QUERY>"));
}

#[test]
fn season_without_episode_fails() {
    reel()
        .args(["sources", "tv/watch-dark-17890", "--season", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--episode"));
}

#[test]
fn missing_config_file_fails() {
    reel()
        .args(["--config", "/nonexistent/reel.toml", "search", "dark"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn malformed_config_file_fails() {
    let mut file = tempfile();
    writeln!(file.1, "[http\ntimeout_secs = ").unwrap();

    reel()
        .args(["--config", file.0.to_str().unwrap(), "search", "dark"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid TOML"));
}

fn tempfile() -> (std::path::PathBuf, std::fs::File) {
    let path = std::env::temp_dir().join(format!("reel-cli-{}.toml", std::process::id()));
    let file = std::fs::File::create(&path).unwrap();
    (path, file)
}
