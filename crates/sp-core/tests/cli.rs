//! End-to-end tests for the `sp-core` binary.
//!
//! Each test runs the real binary against a throwaway project root and
//! asserts on exit codes and stdout payloads.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn sp_core() -> Command {
    let mut cmd = Command::cargo_bin("sp-core").expect("binary built");
    // ambient env must not leak into config or log resolution
    cmd.env_remove("SURVEY_PIPELINE_CONFIG")
        .env_remove("SURVEY_PIPELINE_ROOT")
        .env_remove("SP_LOG")
        .env_remove("RUST_LOG");
    cmd
}

fn seed_staging(root: &Path) {
    let cleaned = root.join("staging/cleaned");
    fs::create_dir_all(&cleaned).unwrap();
    fs::write(
        cleaned.join("survey_responses.csv"),
        "respondent_id,answer\n1,yes\n2,no\n3,yes\n",
    )
    .unwrap();
}

#[test]
fn status_on_fresh_root_succeeds() {
    let root = tempdir().unwrap();

    sp_core()
        .args(["status", "--project-root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"))
        .stdout(predicate::str::contains("\"stable_directory_exists\": false"));
}

#[test]
fn validate_rejects_empty_staging_with_code_one() {
    let root = tempdir().unwrap();

    sp_core()
        .args(["validate", "--project-root"])
        .arg(root.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"valid\": false"));
}

#[test]
fn publish_promotes_staged_data() {
    let root = tempdir().unwrap();
    seed_staging(root.path());

    sp_core()
        .args([
            "publish",
            "--run-timestamp",
            "2026-08-24_10-00-00",
            "--project-root",
        ])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"))
        .stdout(predicate::str::contains("\"total_records\": 3"));

    let stable = root.path().join("cleaned_stable");
    assert!(stable.join("survey_responses.csv").exists());
    assert!(stable
        .join("_publication_metadata_2026-08-24_10-00-00.json")
        .exists());
}

#[test]
fn publish_with_malformed_timestamp_is_an_args_error() {
    let root = tempdir().unwrap();
    seed_staging(root.path());

    sp_core()
        .args([
            "publish",
            "--run-timestamp",
            "not-a-timestamp",
            "--project-root",
        ])
        .arg(root.path())
        .assert()
        .code(10)
        .stdout(predicate::str::contains("invalid run timestamp"));

    assert!(!root.path().join("cleaned_stable").exists());
}

#[test]
fn rollback_to_unknown_backup_is_an_args_error() {
    let root = tempdir().unwrap();

    sp_core()
        .args([
            "rollback",
            "--to",
            "2026-01-01_00-00-00",
            "--project-root",
        ])
        .arg(root.path())
        .assert()
        .code(10)
        .stdout(predicate::str::contains("\"success\": false"));
}

#[test]
fn publish_then_rollback_restores_previous_generation() {
    let root = tempdir().unwrap();
    seed_staging(root.path());

    sp_core()
        .args([
            "publish",
            "--run-timestamp",
            "2026-08-24_10-00-00",
            "--project-root",
        ])
        .arg(root.path())
        .assert()
        .success();

    // Second generation replaces the first.
    let cleaned = root.path().join("staging/cleaned");
    fs::create_dir_all(&cleaned).unwrap();
    fs::write(
        cleaned.join("survey_responses.csv"),
        "respondent_id,answer\n4,maybe\n",
    )
    .unwrap();

    sp_core()
        .args([
            "publish",
            "--run-timestamp",
            "2026-08-24_11-00-00",
            "--project-root",
        ])
        .arg(root.path())
        .assert()
        .success();

    sp_core()
        .args([
            "rollback",
            "--to",
            "2026-08-24_11-00-00",
            "--project-root",
        ])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"));

    let restored = fs::read_to_string(
        root.path().join("cleaned_stable/survey_responses.csv"),
    )
    .unwrap();
    assert!(restored.contains("1,yes"));
}

#[test]
fn list_reports_publications_newest_first() {
    let root = tempdir().unwrap();
    seed_staging(root.path());

    sp_core()
        .args([
            "publish",
            "--run-timestamp",
            "2026-08-24_10-00-00",
            "--project-root",
        ])
        .arg(root.path())
        .assert()
        .success();

    sp_core()
        .args(["list", "--project-root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 1"))
        .stdout(predicate::str::contains("2026-08-24_10-00-00"));
}

#[test]
fn text_format_prints_human_output() {
    let root = tempdir().unwrap();
    seed_staging(root.path());

    sp_core()
        .args(["validate", "--format", "text", "--project-root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("staging is ready: 3 record(s)"));
}

#[test]
fn explicit_config_file_overrides_stable_directory() {
    let root = tempdir().unwrap();
    seed_staging(root.path());
    let config_path = root.path().join("custom.json");
    fs::write(
        &config_path,
        r#"{"publish": {"stable_directory": "published"}}"#,
    )
    .unwrap();

    sp_core()
        .args([
            "publish",
            "--run-timestamp",
            "2026-08-24_10-00-00",
            "--config",
        ])
        .arg(&config_path)
        .arg("--project-root")
        .arg(root.path())
        .assert()
        .success();

    assert!(root.path().join("published/survey_responses.csv").exists());
    assert!(!root.path().join("cleaned_stable").exists());
}

#[test]
fn logs_go_to_stderr_leaving_stdout_for_payloads() {
    let root = tempdir().unwrap();

    sp_core()
        .args(["status", "--project-root"])
        .arg(root.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("dispatching command"))
        .stdout(predicate::str::contains("dispatching command").not());
}

#[test]
fn unreadable_config_is_an_args_error() {
    let root = tempdir().unwrap();
    let config_path = root.path().join("broken.json");
    fs::write(&config_path, "{not json").unwrap();

    sp_core()
        .args(["status", "--config"])
        .arg(&config_path)
        .arg("--project-root")
        .arg(root.path())
        .assert()
        .code(10)
        .stdout(predicate::str::contains("\"success\": false"));
}
