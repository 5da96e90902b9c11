use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn backup_tool() -> Command {
    let mut cmd = Command::cargo_bin("backup-tool").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, body: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("config.json");
    fs::write(&path, body.to_string()).unwrap();
    path
}

#[test]
fn missing_config_fails() {
    let temp_dir = TempDir::new().unwrap();

    backup_tool()
        .current_dir(temp_dir.path())
        .arg("--config")
        .arg(temp_dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading configuration"));
}

#[test]
fn invalid_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.json");
    fs::write(&config, "{ not json").unwrap();

    backup_tool()
        .current_dir(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn dry_run_keeps_expired_archives() {
    let temp_dir = TempDir::new().unwrap();
    let backups = temp_dir.path().join("backups");
    let archives = backups.join("files/hosts");
    fs::create_dir_all(&archives).unwrap();
    fs::write(archives.join("file_20000101_000000.tar.gz"), b"old").unwrap();
    fs::write(temp_dir.path().join("hosts"), b"127.0.0.1 localhost").unwrap();

    let config = write_config(
        temp_dir.path(),
        serde_json::json!({
            "localBackupPath": backups,
            "files": [{"path": temp_dir.path().join("hosts"), "lifetime": 1}]
        }),
    );

    backup_tool()
        .current_dir(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("would prune 1 local"));

    assert!(archives.join("file_20000101_000000.tar.gz").exists());
}

#[test]
fn env_file_feeds_placeholders() {
    let temp_dir = TempDir::new().unwrap();
    let backups = temp_dir.path().join("from-env");
    fs::write(
        temp_dir.path().join("custom.env"),
        format!("BACKUP_ROOT_FOR_CLI_TEST={}\n", backups.display()),
    )
    .unwrap();

    let config = write_config(
        temp_dir.path(),
        serde_json::json!({ "localBackupPath": "$ENV:BACKUP_ROOT_FOR_CLI_TEST" }),
    );

    backup_tool()
        .current_dir(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .arg("--env")
        .arg(temp_dir.path().join("custom.env"))
        .assert()
        .success()
        .stdout(predicate::str::contains("0 archives created"));

    assert!(backups.is_dir());
}

#[test]
fn malformed_env_file_is_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let backups = temp_dir.path().join("backups");
    fs::write(temp_dir.path().join("broken.env"), "NOT A VALID LINE\n").unwrap();

    let config = write_config(temp_dir.path(), serde_json::json!({ "localBackupPath": backups }));

    backup_tool()
        .current_dir(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .arg("--env")
        .arg(temp_dir.path().join("broken.env"))
        .assert()
        .success()
        .stderr(predicate::str::contains("ignoring environment file"))
        .stdout(predicate::str::contains("0 archives created"));

    assert!(backups.is_dir());
}

#[test]
fn failed_target_still_exits_zero() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(
        temp_dir.path(),
        serde_json::json!({
            "localBackupPath": temp_dir.path().join("backups"),
            "databases": [{"name": "shop", "type": "mysql", "userRef": "nobody"}]
        }),
    );

    backup_tool()
        .current_dir(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 failed"))
        .stderr(predicate::str::contains("run finished with errors"));
}

#[test]
fn help_documents_exit_status() {
    backup_tool()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit status"));
}
