//! End-to-end tests of the `runna` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::net::TcpListener;
use tempfile::TempDir;

/// The binary, run from `cwd` with no `RUNNA_*` variables leaking in.
#[allow(deprecated)]
fn runna(cwd: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("runna").unwrap();
    cmd.current_dir(cwd.path())
        .env_remove("RUNNA_HOSTNAME")
        .env_remove("RUNNA_PORT")
        .env_remove("RUNNA_ROOT")
        .env_remove("RUNNA_AUTH")
        .env_remove("RUNNA_RELOAD_PORT")
        .env("NO_COLOR", "1");
    cmd
}

fn closed_port() -> u16 {
    let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn test_help_lists_options() {
    let temp = TempDir::new().unwrap();
    runna(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--hostname"))
        .stdout(predicate::str::contains("--reload"))
        .stdout(predicate::str::contains("--exit"));
}

#[test]
fn test_version() {
    let temp = TempDir::new().unwrap();
    runna(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_reload_and_exit_conflict() {
    let temp = TempDir::new().unwrap();
    runna(&temp).args(["--reload", "--exit"]).assert().failure();
}

#[test]
fn test_missing_root_is_reported() {
    let temp = TempDir::new().unwrap();
    runna(&temp)
        .args(["-w", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Served root not found"));
}

#[test]
fn test_exit_to_unreachable_server_fails() {
    let temp = TempDir::new().unwrap();
    let port = closed_port();
    runna(&temp)
        .args(["-x", "-h", "127.0.0.1", "-p", &port.to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Triggering exit to 127.0.0.1:"));
}

#[test]
fn test_reload_to_unreachable_server_fails() {
    let temp = TempDir::new().unwrap();
    let port = closed_port();
    runna(&temp)
        .args(["--reload", "--hostname", "127.0.0.1", "--port", &port.to_string()])
        .assert()
        .failure();
}

#[test]
fn test_config_file_supplies_port() {
    let temp = TempDir::new().unwrap();
    let port = closed_port();
    std::fs::write(
        temp.path().join("runna.toml"),
        format!("hostname = \"127.0.0.1\"\nport = {}\n", port),
    )
    .unwrap();

    runna(&temp)
        .arg("--exit")
        .assert()
        .failure()
        .stderr(predicate::str::contains(format!("127.0.0.1:{}", port)));
}

#[test]
fn test_explicit_missing_config_file() {
    let temp = TempDir::new().unwrap();
    runna(&temp)
        .args(["--exit", "-c", "absent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.toml"));
}
