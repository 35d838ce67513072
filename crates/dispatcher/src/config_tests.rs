// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for dispatcher configuration

use super::*;
use yare::parameterized;

#[test]
fn defaults_match_documented_values() {
    let tuning = Tuning::default();
    assert_eq!(tuning.poll_interval(), Duration::from_secs(5));
    assert_eq!(tuning.batch_size, 10);
    assert_eq!(tuning.max_retries, 5);
    assert_eq!(tuning.stale_after(), Duration::from_secs(300));
    assert_eq!(tuning.gc_retain(), Duration::from_secs(14 * 24 * 3600));
}

#[parameterized(
    org = { Scope::Organization, 2_000 },
    project = { Scope::Project, 5_000 },
    site = { Scope::Site, 5_000 },
)]
fn debounce_windows_by_scope(scope: Scope, expected_ms: u64) {
    assert_eq!(Tuning::default().debounce_window_ms(scope), expected_ms);
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let config = Config::load_from(&PathBuf::from("/nonexistent/dispatcherd.toml")).unwrap();
    assert_eq!(config.listen_addr, "127.0.0.1:8085");
    assert_eq!(config.dispatcher.batch_size, 10);
}

#[test]
fn partial_file_overrides_only_named_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dispatcherd.toml");
    std::fs::write(
        &path,
        r#"
listen_addr = "0.0.0.0:9000"

[admin]
base_url = "https://admin.example"
token = "svc-token"

[dispatcher]
batch_size = 25
debounce_org_ms = 1000
"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.listen_addr, "0.0.0.0:9000");
    assert_eq!(config.admin.base_url, "https://admin.example");
    assert_eq!(config.dispatcher.batch_size, 25);
    assert_eq!(config.dispatcher.debounce_window_ms(Scope::Organization), 1_000);
    // Untouched knobs keep their defaults.
    assert_eq!(config.dispatcher.max_retries, 5);
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dispatcherd.toml");
    std::fs::write(&path, "batch_size = [not toml").unwrap();

    assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse { .. })));
}
