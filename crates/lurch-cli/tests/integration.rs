#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const VALID: &str = r#"
listen: 127.0.0.1:8080
slack:
  token: xoxb-test
  signing_secret: s3cret
deploy_channel:
  id: C0123456
  name: deployments
docker:
  image: geodata/devops
"#;

fn lurch(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("lurch").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("LURCH_CONFIG")
        .env_remove("LURCH_SLACK_TOKEN")
        .env_remove("LURCH_SLACK_SIGNING_SECRET");
    cmd
}

fn write_config(dir: &TempDir, name: &str, yaml: &str) {
    std::fs::write(dir.path().join(name), yaml).unwrap();
}

// ---------------------------------------------------------------------------
// lurch version
// ---------------------------------------------------------------------------

#[test]
fn version_prints_crate_version() {
    let dir = TempDir::new().unwrap();
    lurch(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!("lurch ", env!("CARGO_PKG_VERSION"))));
}

// ---------------------------------------------------------------------------
// lurch config validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_complete_config() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "lurch.yaml", VALID);
    lurch(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn validate_reports_missing_token_as_error() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "lurch.yaml", &VALID.replace("  token: xoxb-test\n", ""));
    lurch(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] slack.token is empty"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn token_from_environment_satisfies_validation() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "lurch.yaml", &VALID.replace("  token: xoxb-test\n", ""));
    lurch(&dir)
        .env("LURCH_SLACK_TOKEN", "xoxb-from-env")
        .args(["config", "validate"])
        .assert()
        .success();
}

#[test]
fn missing_secret_is_only_a_warning() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "lurch.yaml", &VALID.replace("  signing_secret: s3cret\n", ""));
    lurch(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[warning] slack.signing_secret is not set"));
}

#[test]
fn validate_json_lists_warnings() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "lurch.yaml", &VALID.replace("  signing_secret: s3cret\n", ""));
    let output = lurch(&dir)
        .args(["config", "validate", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["warnings"][0]["level"], "warning");
}

#[test]
fn config_path_from_flag_and_environment() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "other.yaml", VALID);

    lurch(&dir)
        .args(["--config", "other.yaml", "config", "validate"])
        .assert()
        .success();

    lurch(&dir)
        .env("LURCH_CONFIG", "other.yaml")
        .args(["config", "validate"])
        .assert()
        .success();
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    lurch(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config from lurch.yaml"));
}

// ---------------------------------------------------------------------------
// lurch serve
// ---------------------------------------------------------------------------

#[test]
fn serve_refuses_invalid_config() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "lurch.yaml", &VALID.replace("geodata/devops", "\"\""));
    lurch(&dir)
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("docker.image must not be empty"));
}

#[test]
fn serve_refuses_bad_listen_override() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "lurch.yaml", VALID);
    lurch(&dir)
        .args(["serve", "--listen", "not-an-address"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a socket address"));
}
