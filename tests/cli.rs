//! Command-line parsing, configuration errors and exit codes. None of these reach a
//! database.

use assert_cmd::Command;
use predicates::prelude::*;

const CONFIG_VARS: &[&str] = &[
    "DATABASE_URL",
    "SOURCE_DATABASE_URL",
    "SYNC_BATCH_SIZE",
    "ADMIN_API_URL",
    "ADMIN_USERNAME",
    "ADMIN_PASSWORD",
    "RUST_LOG",
];

/// The binary, run from an empty directory so no `.env` file leaks in.
fn cmd(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("content-sync").unwrap();
    cmd.current_dir(dir.path());
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("pull-api"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_sync_without_source_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .arg("sync")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("SOURCE_DATABASE_URL"));
}

#[test]
fn test_sync_without_destination_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(["sync", "--source", "postgres://user@localhost/source"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("DATABASE_URL"));
}

#[test]
fn test_zero_batch_size_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(["import", "export.json", "--batch-size", "0"])
        .env("DATABASE_URL", "postgres://user@localhost/destination")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("batch size"));
}

#[test]
fn test_unknown_table_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(["import", "export.json", "--table", "widgets"])
        .env("DATABASE_URL", "postgres://user@localhost/destination")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("widgets"));
}

#[test]
fn test_missing_snapshot_fails_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(["import", "missing.json"])
        .env("DATABASE_URL", "postgres://user@localhost/destination")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing.json"));
}

#[test]
fn test_pull_api_requires_credentials() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(["pull-api", "--api-url", "https://example.org"])
        .env("DATABASE_URL", "postgres://user@localhost/destination")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ADMIN_USERNAME"));
}

#[test]
fn test_template_writes_every_content_table() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(["template", "--output", "template.json"])
        .assert()
        .success();
    let text = std::fs::read_to_string(dir.path().join("template.json")).unwrap();
    let template: serde_json::Value = serde_json::from_str(&text).unwrap();
    let tables = template.as_object().unwrap();
    assert_eq!(tables.len(), 16);
    assert_eq!(tables["team_members"], serde_json::json!([]));
    assert!(!tables.contains_key("users"));
}
