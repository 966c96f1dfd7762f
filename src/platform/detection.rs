//! Host detection combining release metadata and architecture

use std::path::Path;

use crate::error::{FalconError, Result};

use super::os_release::{self, OsRelease};
use super::{Arch, HostOs, OsLabel};

/// Standard os-release location.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Identify the running host.
pub fn detect() -> Result<HostOs> {
    let release = os_release::read(Path::new(OS_RELEASE_PATH))
        .or_else(os_release::from_lsb_release)
        .ok_or(FalconError::OsReleaseUnavailable)?;
    classify(&release, Arch::current()?)
}

/// Map raw release metadata onto a catalog label and major version.
pub fn classify(release: &OsRelease, arch: Arch) -> Result<HostOs> {
    let label = OsLabel::from_name(&release.name)?;
    let major_version = release.major_version().to_string();
    if major_version.is_empty() {
        return Err(FalconError::UnsupportedOs {
            name: format!("{} (no VERSION_ID)", release.name),
        });
    }

    let host = HostOs {
        label,
        major_version,
        arch,
    };
    tracing::debug!(os = %release.name, version = %release.version_id, host = %host, "Host identified");
    Ok(host)
}
