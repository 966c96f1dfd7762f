//! Common test utilities for falcon-linux-install integration tests

use assert_cmd::Command;

/// Every environment variable the installer reads its options from.
pub const OPTION_VARIABLES: &[&str] = &[
    "FALCON_CLIENT_ID",
    "FALCON_CLIENT_SECRET",
    "FALCON_ACCESS_TOKEN",
    "FALCON_CLOUD",
    "FALCON_CID",
    "FALCON_SENSOR_VERSION_DECREMENT",
    "FALCON_PROVISIONING_TOKEN",
    "FALCON_SENSOR_UPDATE_POLICY_NAME",
    "FALCON_TAGS",
    "FALCON_APD",
    "FALCON_APH",
    "FALCON_APP",
    "FALCON_BILLING",
    "FALCON_BACKEND",
    "FALCON_TRACE",
    "FALCON_UNINSTALL",
    "FALCON_INSTALL_ONLY",
    "FALCON_DOWNLOAD_ONLY",
    "FALCON_DOWNLOAD_PATH",
    "ALLOW_LEGACY_CURL",
    "GET_ACCESS_TOKEN",
    "FALCON_GPG_KEY",
    "FALCON_API_BASE_URL",
];

/// The real binary with no option variables inherited from the test runner.
///
/// The API base URL points at a closed local port so a test that slips past
/// validation fails fast instead of reaching the network.
#[allow(deprecated)]
pub fn falcon_cmd() -> Command {
    let mut cmd = Command::cargo_bin("falcon-linux-install").unwrap();
    for variable in OPTION_VARIABLES {
        cmd.env_remove(variable);
    }
    cmd.env("FALCON_API_BASE_URL", "http://127.0.0.1:9");
    cmd
}
