//! CLI integration tests using the REAL falcon-linux-install binary

mod common;

use common::falcon_cmd;
use predicates::prelude::*;

#[test]
fn test_help_output() {
    falcon_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Falcon API"))
        .stdout(predicate::str::contains("--client-id"))
        .stdout(predicate::str::contains("FALCON_CLOUD"))
        .stdout(predicate::str::contains("--uninstall"));
}

#[test]
fn test_version_flag() {
    falcon_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_command() {
    falcon_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("falcon-linux-install"))
        .stdout(predicate::str::contains("Build info"))
        .stdout(predicate::str::contains("crowdstrike-falcon-scripts/"));
}

#[test]
fn test_completions_bash() {
    falcon_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("falcon-linux-install"));
}

#[test]
fn test_completions_unknown_shell() {
    falcon_cmd()
        .args(["completions", "tcsh"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid shell: 'tcsh'"));
}

#[test]
fn test_unknown_flag_exits_one() {
    falcon_cmd()
        .arg("--no-such-flag")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--no-such-flag"));
}
