// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for secrets rendering and installation

use super::*;
use libops_core::test_support::secret;
use std::path::PathBuf;
use yare::parameterized;

fn settings(secrets_path: PathBuf) -> ApplySettings {
    ApplySettings {
        home_root: PathBuf::from("/home"),
        exec_group: "docker".to_string(),
        secrets_path,
        firewall_chain: "LIBOPS-FIREWALL".to_string(),
    }
}

#[parameterized(
    plain = { "hunter2", r#"API_KEY="hunter2""# },
    with_quote = { r#"pa"ss"#, r#"API_KEY="pa\"ss""# },
    with_backslash = { r"back\slash", r#"API_KEY="back\\slash""# },
    with_spaces = { "two words", r#"API_KEY="two words""# },
    empty = { "", r#"API_KEY="""# },
)]
fn values_are_shell_quoted(value: &str, expected_line: &str) {
    let rendered = render(&[secret(1, "API_KEY", value)]);
    assert_eq!(rendered, format!("{expected_line}\n"));
}

#[test]
fn renders_one_line_per_secret_in_list_order() {
    let rendered = render(&[
        secret(1, "ZETA", "1"),
        secret(2, "ALPHA", "2"),
    ]);
    assert_eq!(rendered, "ZETA=\"1\"\nALPHA=\"2\"\n");
}

#[test]
fn apply_writes_with_restrictive_modes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("libops").join("secrets.env");
    let cfg = settings(path.clone());

    apply(&cfg, &[secret(1, "API_KEY", "hunter2")]).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content, "API_KEY=\"hunter2\"\n");

    let file_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(file_mode, 0o600);
    let dir_mode =
        std::fs::metadata(path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
    assert_eq!(dir_mode, 0o755);
}

#[test]
fn apply_is_idempotent_byte_for_byte() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.env");
    let cfg = settings(path.clone());
    let list = vec![secret(1, "A", "1"), secret(2, "B", "x y z")];

    apply(&cfg, &list).unwrap();
    let first = std::fs::read(&path).unwrap();
    apply(&cfg, &list).unwrap();
    let second = std::fs::read(&path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn no_tmp_file_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.env");
    apply(&settings(path.clone()), &[secret(1, "A", "1")]).unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name() != "secrets.env")
        .collect();
    assert!(leftovers.is_empty());
}
