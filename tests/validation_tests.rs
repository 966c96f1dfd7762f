//! Option validation through the real binary
//!
//! Every case here must fail before any network access or privilege check.

mod common;

use common::falcon_cmd;
use predicates::prelude::*;

#[test]
fn test_invalid_backend_rejected() {
    falcon_cmd()
        .env("FALCON_BACKEND", "xyz")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid FALCON_BACKEND: 'xyz'"))
        .stderr(predicate::str::contains("auto, bpf, kernel"));
}

#[test]
fn test_invalid_cloud_rejected() {
    falcon_cmd()
        .env("FALCON_CLOUD", "us-3")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid FALCON_CLOUD: 'us-3'"));
}

#[test]
fn test_invalid_billing_flag_rejected() {
    falcon_cmd()
        .args(["--billing", "free"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid FALCON_BILLING: 'free'"));
}

#[test]
fn test_invalid_trace_rejected() {
    falcon_cmd()
        .env("FALCON_TRACE", "verbose")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid FALCON_TRACE"));
}

#[test]
fn test_invalid_apd_rejected() {
    falcon_cmd()
        .env("FALCON_APD", "yes")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid FALCON_APD: 'yes'"));
}

#[test]
fn test_flag_overrides_environment() {
    falcon_cmd()
        .env("FALCON_BACKEND", "kernel")
        .args(["--backend", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'nope'"));
}

#[test]
fn test_decrement_out_of_range() {
    falcon_cmd()
        .env("FALCON_SENSOR_VERSION_DECREMENT", "6")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Invalid FALCON_SENSOR_VERSION_DECREMENT: '6'",
        ));
}

#[test]
fn test_decrement_not_a_number() {
    falcon_cmd()
        .env("FALCON_SENSOR_VERSION_DECREMENT", "two")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("FALCON_SENSOR_VERSION_DECREMENT"));
}

#[test]
fn test_access_token_requires_cloud() {
    falcon_cmd()
        .env("FALCON_ACCESS_TOKEN", "abc")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("FALCON_CLOUD must be set"));
}

#[test]
fn test_partial_client_credentials() {
    falcon_cmd()
        .env("FALCON_CLIENT_ID", "only-the-id")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Missing FALCON_CLIENT_ID and FALCON_CLIENT_SECRET",
        ));
}

#[test]
fn test_conflicting_modes() {
    falcon_cmd()
        .env("FALCON_UNINSTALL", "true")
        .env("FALCON_DOWNLOAD_ONLY", "true")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Conflicting options"));
}

#[test]
fn test_invalid_proxy_port() {
    falcon_cmd()
        .env("FALCON_APP", "99999")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid FALCON_APP: '99999'"));
}
