// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use super::*;
use tempfile::TempDir;
use yare::parameterized;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.store_url, "ws://localhost:7890");
    assert_eq!(config.tracker_url, "http://localhost:3001");
    assert_eq!(config.poll_interval_ms, 5_000);
    assert_eq!(config.issue_poll_interval_ms, 30_000);
    assert_eq!(config.scope, "test_cards");
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_file_is_all_defaults() {
    assert_eq!(Config::parse("").unwrap(), Config::default());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let config = Config::parse(
        r#"
store_url = "wss://board.example.com/store"
poll_interval_ms = 2000
tester = "marta"
"#,
    )
    .unwrap();

    assert_eq!(config.store_url, "wss://board.example.com/store");
    assert_eq!(config.poll_interval_ms, 2_000);
    assert_eq!(config.tester.as_deref(), Some("marta"));
    assert_eq!(config.tracker_url, "http://localhost:3001");
}

#[test]
fn test_unknown_key_is_rejected() {
    let err = Config::parse("pol_interval_ms = 1").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_env_overrides_file() {
    let mut config = Config::parse(r#"store_url = "ws://file:1""#).unwrap();
    config.apply_env(env_of(&[
        ("TESTBOARD_STORE_URL", "ws://env:2"),
        ("TESTBOARD_USER", "jordi"),
    ]));

    assert_eq!(config.store_url, "ws://env:2");
    assert_eq!(config.tester.as_deref(), Some("jordi"));
    assert_eq!(config.tracker_url, "http://localhost:3001");
}

#[parameterized(
    http_store = { "store_url = \"http://localhost:7890\"", "store_url" },
    ws_tracker = { "tracker_url = \"ws://localhost:3001\"", "tracker_url" },
    zero_poll = { "poll_interval_ms = 0", "poll_interval_ms" },
    zero_issue_poll = { "issue_poll_interval_ms = 0", "issue_poll_interval_ms" },
    blank_scope = { "scope = \" \"", "scope" },
)]
fn test_validate_rejects(toml: &str, field: &str) {
    let config = Config::parse(toml).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains(field));
}

#[test]
fn test_durations_follow_config() {
    let config = Config::parse("poll_interval_ms = 250\nissue_poll_interval_ms = 1000").unwrap();
    let board = config.board_config();
    assert_eq!(board.sync.poll_interval, Duration::from_millis(250));
    assert_eq!(board.issue_poll_interval, Duration::from_secs(1));
    assert_eq!(board.sync.scope, "test_cards");
}

#[test]
fn test_load_explicit_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("board.toml");
    std::fs::write(&path, "tracker_url = \"https://proxy.example.com\"\n").unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.tracker_url, "https://proxy.example.com");
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let err = Config::load(Some(&temp.path().join("nope.toml"))).unwrap_err();
    assert!(err.to_string().contains("nope.toml"));
}

#[test]
fn test_parse_error_names_the_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.toml");
    std::fs::write(&path, "store_url = [").unwrap();

    let err = Config::from_file(&path).unwrap_err();

    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn test_images_root_prefers_configured_dir() {
    let config = Config {
        images_dir: Some(PathBuf::from("/srv/images")),
        ..Config::default()
    };
    assert_eq!(config.images_root(), PathBuf::from("/srv/images"));
}
