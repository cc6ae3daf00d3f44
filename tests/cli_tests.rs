//! CLI tests
//!
//! Spawn the `layercfg` binary and check output, redaction and exit codes.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const SECRET: &str = "hunter2";

fn layercfg() -> Command {
    let mut cmd = Command::cargo_bin("layercfg").unwrap();
    cmd.env_remove("LAYERCFG_LOG");
    cmd
}

fn write_definitions(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("definitions.toml");
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().to_string()
}

const PASSWORD_DEFINITIONS: &str = r#"
[[definition]]
name = "pooledDataSource"
mandatory = true

[[definition.condition]]
type = "on_property"
key = "datasource.password"
having_value = "nope"

[[definition]]
name = "webServer"
"#;

#[test]
fn test_resolve_human_redacts_secret() {
    layercfg()
        .args(["resolve", "--", "--datasource.password=hunter2", "--server.port=9090"])
        .assert()
        .success()
        .stdout(contains("datasource.password = [REDACTED]"))
        .stdout(contains("server.port = 9090"))
        .stdout(contains(SECRET).not());
}

#[test]
fn test_resolve_json_redacts_secret() {
    let output = layercfg()
        .args(["resolve", "--json", "--show-origin", "--", "--datasource.password=hunter2"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains(SECRET));

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["properties"]["datasource.password"]["value"], "[REDACTED]");
    assert_eq!(json["properties"]["datasource.password"]["layer"], "commandLineArgs");
    assert_eq!(json["redactions"][0], "datasource.password");
}

#[test]
fn test_resolve_key_redacts_secret() {
    layercfg()
        .args(["resolve", "--key", "datasource.password", "--", "--datasource.password=hunter2"])
        .assert()
        .success()
        .stdout("[REDACTED]\n");

    layercfg()
        .args([
            "resolve",
            "--key",
            "datasource.password",
            "--json",
            "--",
            "--datasource.password=hunter2",
        ])
        .assert()
        .success()
        .stdout(contains("[REDACTED]"))
        .stdout(contains(SECRET).not());
}

#[test]
fn test_resolve_missing_key_exits_1() {
    layercfg()
        .args(["resolve", "--key", "server.port"])
        .assert()
        .code(1)
        .stderr(contains("Property 'server.port' is not set"));
}

#[test]
fn test_env_prefix_is_applied() {
    layercfg()
        .env("LAYERCFG_CLI_SERVER_PORT", "9090")
        .env("SERVER_PORT", "1111")
        .args([
            "resolve",
            "--env",
            "--env-prefix",
            "LAYERCFG_CLI_",
            "--key",
            "server.port",
            "--show-origin",
        ])
        .assert()
        .success()
        .stdout("9090  [systemEnvironment]\n");
}

#[test]
fn test_config_file_with_profile() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("application.toml");
    fs::write(&base, "[server]\nport = 8080\n").unwrap();
    fs::write(dir.path().join("application-prod.toml"), "[server]\nport = 443\n").unwrap();

    layercfg()
        .args(["resolve", "--config"])
        .arg(&base)
        .args(["--profile", "prod", "--key", "server.port"])
        .assert()
        .success()
        .stdout("443\n");
}

#[test]
fn test_bad_config_exits_1() {
    layercfg()
        .args(["resolve", "--config", "/nonexistent/application.toml"])
        .assert()
        .code(1)
        .stderr(contains("Error loading configuration"));
}

#[test]
fn test_profiles_lists_group_members() {
    layercfg()
        .args(["profiles", "--", "--profiles.active=local", "--profiles.group.local=dev,h2"])
        .assert()
        .success()
        .stdout(contains("Active profiles (2):"))
        .stdout(contains("  dev\n  h2"));
}

#[test]
fn test_select_unsatisfied_exits_2_without_secret() {
    let dir = TempDir::new().unwrap();
    let definitions = write_definitions(&dir, PASSWORD_DEFINITIONS);

    layercfg()
        .args(["select", "--definitions", &definitions, "--", "--datasource.password=hunter2"])
        .assert()
        .code(2)
        .stdout(contains("Unsatisfied mandatory definitions:"))
        .stdout(contains("Selected: webServer"))
        .stdout(contains(SECRET).not());

    layercfg()
        .args([
            "select",
            "--definitions",
            &definitions,
            "--json",
            "--",
            "--datasource.password=hunter2",
        ])
        .assert()
        .code(2)
        .stdout(contains("\"unsatisfied\""))
        .stdout(contains(SECRET).not());
}

#[test]
fn test_select_satisfied_exits_0() {
    let dir = TempDir::new().unwrap();
    let definitions = write_definitions(&dir, PASSWORD_DEFINITIONS);

    layercfg()
        .args(["select", "--definitions", &definitions, "--", "--datasource.password=nope"])
        .assert()
        .success()
        .stdout(contains("Selected: pooledDataSource, webServer"));
}
