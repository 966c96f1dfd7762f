//! Native package installation
//!
//! This module handles:
//! - Choosing the host's package manager (by presence in `PATH`)
//! - Installing the downloaded package, falling back to `rpm`/`dpkg`
//! - Removing the installed sensor package
//! - Importing the RPM signing key (via signing module)
//!
//! Every action is planned as a primary [`Invocation`] plus a lower-level
//! fallback, so the plans can be inspected without running anything.

pub mod command;
pub mod signing;

use std::fmt;
use std::path::Path;

use crate::error::{FalconError, Result};
use crate::platform::{HostOs, OsLabel};

pub use command::{Invocation, is_available};

/// Name of the installed sensor package.
pub const PACKAGE_NAME: &str = "falcon-sensor";

/// Package managers the installer can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Dnf,
    Yum,
    Zypper,
    AptGet,
}

impl PackageManager {
    /// Probe order when the distribution does not dictate a tool.
    pub const DETECTION_ORDER: [PackageManager; 4] = [
        PackageManager::Dnf,
        PackageManager::Yum,
        PackageManager::Zypper,
        PackageManager::AptGet,
    ];

    pub fn binary(self) -> &'static str {
        match self {
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Zypper => "zypper",
            PackageManager::AptGet => "apt-get",
        }
    }

    /// Pick the package manager for `host` from the process `PATH`.
    pub fn detect(host: &HostOs) -> Result<Self> {
        Self::detect_with(host, is_available)
    }

    /// Pick the package manager for `host`, probing with `available`.
    ///
    /// Amazon Linux 2023 always installs through `dnf`; its `yum` is only a
    /// compatibility shim.
    pub fn detect_with(host: &HostOs, available: impl Fn(&str) -> bool) -> Result<Self> {
        if host.label == OsLabel::AmazonLinux && host.major_version == "2023" {
            return Ok(PackageManager::Dnf);
        }
        Self::DETECTION_ORDER
            .into_iter()
            .find(|pm| available(pm.binary()))
            .ok_or(FalconError::NoPackageManager)
    }

    /// Install `package`: the package manager first, then a forced low-level install.
    pub fn install_plan(self, package: &Path) -> (Invocation, Invocation) {
        let package = package.display().to_string();
        let package = package.as_str();
        match self {
            PackageManager::Dnf | PackageManager::Yum => (
                Invocation::new(self.binary(), ["install", "-q", "-y", package]),
                rpm_install(package),
            ),
            PackageManager::Zypper => (
                Invocation::new("zypper", ["--quiet", "install", "-y", package]),
                rpm_install(package),
            ),
            PackageManager::AptGet => (
                Invocation::new("apt-get", ["-qq", "install", "-y", package])
                    .with_env("DEBIAN_FRONTEND", "noninteractive"),
                Invocation::new("dpkg", ["-i", package]),
            ),
        }
    }

    /// Remove the sensor package: the package manager first, then a forced removal.
    pub fn remove_plan(self) -> (Invocation, Invocation) {
        match self {
            PackageManager::Dnf | PackageManager::Yum => (
                Invocation::new(self.binary(), ["remove", "-q", "-y", PACKAGE_NAME]),
                rpm_erase(),
            ),
            PackageManager::Zypper => (
                Invocation::new("zypper", ["--quiet", "remove", "-y", PACKAGE_NAME]),
                rpm_erase(),
            ),
            PackageManager::AptGet => (
                Invocation::new("apt-get", ["purge", "-y", PACKAGE_NAME])
                    .with_env("DEBIAN_FRONTEND", "noninteractive"),
                Invocation::new("dpkg", ["-r", PACKAGE_NAME]),
            ),
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

fn rpm_install(package: &str) -> Invocation {
    Invocation::new("rpm", ["-ivh", "--nodeps", package])
}

fn rpm_erase() -> Invocation {
    Invocation::new("rpm", ["-e", "--nodeps", PACKAGE_NAME])
}

/// Install the downloaded package at `package`.
pub fn install_package(pm: PackageManager, package: &Path) -> Result<()> {
    let (primary, fallback) = pm.install_plan(package);
    command::run_with_fallback(&primary, &fallback).map_err(|reason| {
        FalconError::PackageInstallFailed {
            package: package.display().to_string(),
            reason,
        }
    })?;
    tracing::info!(package = %package.display(), %pm, "Package installed");
    Ok(())
}

/// Remove the installed sensor package.
pub fn remove_package(pm: PackageManager) -> Result<()> {
    let (primary, fallback) = pm.remove_plan();
    command::run_with_fallback(&primary, &fallback)
        .map_err(|reason| FalconError::PackageRemoveFailed { reason })?;
    tracing::info!(%pm, "Package removed");
    Ok(())
}
