//! Installed sensor control
//!
//! - [`falconctl`]: registration through the local control binary
//! - [`service`]: restarting the host service and checking it runs

pub mod falconctl;
pub mod service;

use std::path::Path;

/// Local control binary shipped with the sensor package.
pub const FALCONCTL_PATH: &str = "/opt/CrowdStrike/falconctl";

/// Host service (and process) name of the sensor.
pub const SERVICE_NAME: &str = "falcon-sensor";

/// Whether a sensor is already installed on this host.
pub fn is_installed() -> bool {
    is_installed_at(Path::new(FALCONCTL_PATH))
}

pub fn is_installed_at(falconctl: &Path) -> bool {
    falconctl.is_file()
}
