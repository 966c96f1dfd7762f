//! Host service control for the sensor

use std::fs;
use std::path::Path;

use crate::error::{FalconError, Result};
use crate::installer::{Invocation, is_available};

use super::SERVICE_NAME;

/// Service managers able to restart the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceManager {
    Systemd,
    SysV,
}

impl ServiceManager {
    /// `systemctl` when present, the `service` wrapper otherwise.
    pub fn detect() -> Self {
        Self::detect_with(is_available)
    }

    pub fn detect_with(available: impl Fn(&str) -> bool) -> Self {
        if available("systemctl") {
            ServiceManager::Systemd
        } else {
            ServiceManager::SysV
        }
    }

    pub fn restart_invocation(self) -> Invocation {
        match self {
            ServiceManager::Systemd => Invocation::new("systemctl", ["restart", SERVICE_NAME]),
            ServiceManager::SysV => Invocation::new("service", [SERVICE_NAME, "restart"]),
        }
    }
}

/// Restart the sensor service.
pub fn restart(manager: ServiceManager) -> Result<()> {
    manager
        .restart_invocation()
        .run()
        .map_err(|reason| FalconError::ServiceRestartFailed { reason })?;
    tracing::info!(?manager, "Sensor service restarted");
    Ok(())
}

/// Whether a sensor process is visible on this host.
pub fn is_running() -> bool {
    is_running_in(Path::new("/proc"))
}

/// Scan a procfs-style tree for a process named like the sensor.
pub fn is_running_in(proc_root: &Path) -> bool {
    let Ok(entries) = fs::read_dir(proc_root) else {
        return false;
    };
    entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.bytes().all(|b| b.is_ascii_digit()))
        })
        .any(|entry| {
            fs::read_to_string(entry.path().join("comm"))
                .is_ok_and(|comm| comm.trim() == SERVICE_NAME)
        })
}
