//! Error scenario integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn capture_pin_bin(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("capture-pin").unwrap();
    cmd.env("HOME", config_home.path())
        .env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("CAPTURE_PIN_UPLOAD_URL");
    cmd
}

#[test]
fn invalid_resolution_is_usage_error() {
    let home = TempDir::new().unwrap();
    capture_pin_bin(&home)
        .args(["--resolution", "wide"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("resolution"));
}

#[test]
fn invalid_interval_is_usage_error() {
    let home = TempDir::new().unwrap();
    capture_pin_bin(&home)
        .args(["--interval", "soon"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("photo_interval"));
}

#[test]
fn invalid_upload_url_from_env() {
    let home = TempDir::new().unwrap();
    capture_pin_bin(&home)
        .env("CAPTURE_PIN_UPLOAD_URL", "ftp://files.example.com")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("http://"));
}

#[test]
fn invalid_config_file_value_is_usage_error() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("capture-pin");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "quality = 0\n").unwrap();

    capture_pin_bin(&home)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("quality"));
}

#[test]
fn upload_missing_file() {
    let home = TempDir::new().unwrap();
    capture_pin_bin(&home)
        .args(["upload", "/nonexistent/clip.wav"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn upload_rejects_bad_server_flag() {
    let home = TempDir::new().unwrap();
    capture_pin_bin(&home)
        .args(["upload", "clip.wav", "--server", "pi.local"])
        .assert()
        .code(2);
}

#[test]
fn config_get_unknown_key() {
    let home = TempDir::new().unwrap();
    capture_pin_bin(&home)
        .args(["config", "get", "api_key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_set_invalid_value() {
    let home = TempDir::new().unwrap();
    capture_pin_bin(&home)
        .args(["config", "set", "button_pin", "40"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("button_pin"));
}

#[test]
fn config_init_twice_fails() {
    let home = TempDir::new().unwrap();
    capture_pin_bin(&home).args(["config", "init"]).assert().success();
    capture_pin_bin(&home)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
