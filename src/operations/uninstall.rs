//! Uninstall operation module

use crate::error::Result;
use crate::installer::{self, PackageManager};
use crate::platform;
use crate::sensor;
use crate::ui;

/// High-level uninstall operation
#[derive(Debug, Default)]
pub struct UninstallOperation;

impl UninstallOperation {
    pub fn new() -> Self {
        Self
    }

    /// Remove the sensor package.
    ///
    /// A failed removal is reported with its own exit code.
    pub fn execute(&self) -> Result<()> {
        if !sensor::is_installed() {
            ui::warn("Falcon sensor is not installed, nothing to remove");
            return Ok(());
        }

        let host = platform::detect()?;
        let pm = PackageManager::detect(&host)?;
        ui::step(&format!("Removing Falcon sensor with {pm}"));
        installer::remove_package(pm)?;
        ui::success("Falcon sensor removed");
        Ok(())
    }
}
