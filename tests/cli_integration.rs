//! End-to-end runs of the `envmigrate` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn envmigrate(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("envmigrate"));
    cmd.current_dir(dir);
    cmd.env_remove("RUST_LOG");
    cmd.env("NO_COLOR", "1");
    cmd
}

fn fixture_dir() -> TempDir {
    let dir = tempdir().unwrap();
    let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/environments");
    let target = dir.path().join("environments");
    fs::create_dir_all(&target).unwrap();
    for entry in fs::read_dir(source).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), target.join(entry.file_name())).unwrap();
    }
    dir
}

#[test]
fn list_prints_catalogue() {
    let dir = tempdir().unwrap();
    envmigrate(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Duplicate headers are removed"))
        .stdout(predicate::str::contains("Current schema version: 14"));
}

#[test]
fn migrate_reports_per_file_and_fails_on_broken_fixture() {
    let dir = fixture_dir();
    envmigrate(dir.path())
        .args(["migrate", "environments"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("legacy-v0.json: migrated (0 -> 14)"))
        .stdout(predicate::str::contains("current-v14.json: up to date"))
        .stdout(predicate::str::contains(
            "future-v99.json: skipped: more recent version 99 (current 14)",
        ))
        .stdout(predicate::str::contains("broken-status-v3.json: failed: "))
        .stderr(predicate::str::contains("2 of 6 environment file(s) failed to migrate"));
}

#[test]
fn migrate_with_excludes_succeeds() {
    let dir = fixture_dir();
    envmigrate(dir.path())
        .args([
            "migrate",
            "environments",
            "--exclude",
            "broken-*.json",
            "--exclude",
            "malformed-*.json",
            "--no-parallel",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 migrated, 1 up to date, 1 skipped, 0 failed"));

    let legacy: Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("environments/legacy-v0.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(legacy["lastMigration"], 14);
}

#[test]
fn dry_run_leaves_files_alone() {
    let dir = fixture_dir();
    let path = dir.path().join("environments/legacy-v0.json");
    let before = fs::read_to_string(&path).unwrap();

    envmigrate(dir.path())
        .args(["migrate", "environments/legacy-v0.json", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(dry run)"));

    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn excludes_from_config_file_apply() {
    let dir = fixture_dir();
    fs::write(
        dir.path().join(".envmigrate.toml"),
        "[batch]\ninclude = [\"environments\"]\nexclude = [\"broken-*.json\", \"malformed-*.json\"]\n",
    )
    .unwrap();

    envmigrate(dir.path()).arg("migrate").assert().success();
}

#[test]
fn bare_migrate_leaves_unrelated_json_alone() {
    let dir = tempdir().unwrap();
    let package = dir.path().join("package.json");
    let before = "{\"name\":\"app\",\"version\":\"1.0.0\"}";
    fs::write(&package, before).unwrap();

    envmigrate(dir.path())
        .arg("migrate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("package.json").not())
        .stderr(predicate::str::contains("no files given"));
    envmigrate(dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no files given"));

    assert_eq!(fs::read_to_string(&package).unwrap(), before);
}

#[test]
fn explicit_broken_config_is_an_error() {
    let dir = fixture_dir();
    fs::write(dir.path().join("bad.toml"), "[batch\n").unwrap();

    envmigrate(dir.path())
        .args(["migrate", "--config", "bad.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn status_is_a_ci_check() {
    let dir = fixture_dir();
    envmigrate(dir.path())
        .args(["status", "environments/current-v14.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("version 14, up to date"));

    envmigrate(dir.path())
        .args(["status", "environments/legacy-v0.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("unstamped, 14 migration(s) pending"));
}

#[test]
fn status_json_lines() {
    let dir = fixture_dir();
    let output = envmigrate(dir.path())
        .args(["status", "environments/future-v99.json", "--json"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let line: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(line["status"], "future_version");
    assert_eq!(line["version"], 99);
}

#[test]
fn init_writes_config_once() {
    let dir = tempdir().unwrap();
    envmigrate(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created .envmigrate.toml"));
    assert!(dir.path().join(".envmigrate.toml").exists());

    envmigrate(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    envmigrate(dir.path()).args(["init", "--force"]).assert().success();
}
