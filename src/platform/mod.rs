//! Host operating system identification
//!
//! This module handles:
//! - Reading release metadata (via os_release module)
//! - CPU architecture classification and its catalog filter (via arch module)
//! - Mapping distribution names onto the labels the installer catalog uses
//! - Building the installer catalog filter for this host

use std::fmt;

use crate::error::{FalconError, Result};

pub mod arch;
pub mod detection;
pub mod os_release;

pub use arch::Arch;
pub use detection::detect;

/// Distribution family as labelled in the installer catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsLabel {
    AmazonLinux,
    Rhel,
    Debian,
    Ubuntu,
    Sles,
}

/// Name prefixes (lowercase) for each label, covering both os-release `NAME`
/// and `lsb_release -si` spellings.
const NAME_PREFIXES: &[(&str, OsLabel)] = &[
    ("amazon", OsLabel::AmazonLinux),
    ("centos", OsLabel::Rhel),
    ("red hat", OsLabel::Rhel),
    ("redhat", OsLabel::Rhel),
    ("oracle", OsLabel::Rhel),
    ("rocky", OsLabel::Rhel),
    ("almalinux", OsLabel::Rhel),
    ("debian", OsLabel::Debian),
    ("ubuntu", OsLabel::Ubuntu),
    ("sles", OsLabel::Sles),
    ("suse", OsLabel::Sles),
];

impl OsLabel {
    /// Classify a raw distribution name.
    pub fn from_name(name: &str) -> Result<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        NAME_PREFIXES
            .iter()
            .find(|(prefix, _)| lowered.starts_with(prefix))
            .map(|(_, label)| *label)
            .ok_or_else(|| FalconError::UnsupportedOs {
                name: name.trim().to_string(),
            })
    }

    /// Value of the catalog `os` field for this family.
    pub fn catalog_name(self) -> &'static str {
        match self {
            OsLabel::AmazonLinux => "Amazon Linux",
            OsLabel::Rhel => "*RHEL*",
            OsLabel::Debian => "Debian",
            OsLabel::Ubuntu => "Ubuntu",
            OsLabel::Sles => "*SLES",
        }
    }

    /// Whether packages for this family are RPMs.
    pub fn is_rpm(self) -> bool {
        matches!(self, OsLabel::AmazonLinux | OsLabel::Rhel | OsLabel::Sles)
    }
}

impl fmt::Display for OsLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_name())
    }
}

/// Identified host: distribution family, major version and architecture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOs {
    pub label: OsLabel,
    pub major_version: String,
    pub arch: Arch,
}

impl HostOs {
    /// FQL filter selecting installers for this host.
    ///
    /// Amazon Linux versions are matched exactly since `2` is a substring of
    /// `2023`; other families match the major version anywhere in the
    /// catalog's `os_version` (e.g. Ubuntu's `16/18/20/22`).
    pub fn installer_filter(&self, pinned_version: Option<&str>) -> String {
        let os_version = match self.label {
            OsLabel::AmazonLinux => self.major_version.clone(),
            _ => format!("*{}*", self.major_version),
        };
        let mut filter = format!(
            "os:\"{}\"+os_version:\"{}\"{}",
            self.label.catalog_name(),
            os_version,
            self.arch.filter_fragment()
        );
        if let Some(version) = pinned_version {
            filter.push_str(&format!("+version:\"{version}\""));
        }
        filter
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.label, self.major_version, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpm_family_names_collapse_to_rhel() {
        for name in [
            "CentOS Linux",
            "CentOS Stream",
            "Red Hat Enterprise Linux",
            "Red Hat Enterprise Linux Server",
            "RedHatEnterpriseServer",
            "Oracle Linux Server",
            "Rocky Linux",
            "AlmaLinux",
        ] {
            assert_eq!(OsLabel::from_name(name).unwrap(), OsLabel::Rhel, "{name}");
        }
    }

    #[test]
    fn test_other_families() {
        assert_eq!(
            OsLabel::from_name("Amazon Linux").unwrap(),
            OsLabel::AmazonLinux
        );
        assert_eq!(
            OsLabel::from_name("Debian GNU/Linux").unwrap(),
            OsLabel::Debian
        );
        assert_eq!(OsLabel::from_name("Ubuntu").unwrap(), OsLabel::Ubuntu);
        assert_eq!(OsLabel::from_name("SLES").unwrap(), OsLabel::Sles);
        assert_eq!(
            OsLabel::from_name("SUSE Linux Enterprise Server").unwrap(),
            OsLabel::Sles
        );
    }

    #[test]
    fn test_unrecognized_os() {
        let err = OsLabel::from_name("Arch Linux").unwrap_err();
        assert!(matches!(err, FalconError::UnsupportedOs { ref name } if name == "Arch Linux"));
    }

    #[test]
    fn test_rpm_families() {
        assert!(OsLabel::Rhel.is_rpm());
        assert!(OsLabel::Sles.is_rpm());
        assert!(OsLabel::AmazonLinux.is_rpm());
        assert!(!OsLabel::Ubuntu.is_rpm());
        assert!(!OsLabel::Debian.is_rpm());
    }

    #[test]
    fn test_installer_filter_rhel_x86() {
        let host = HostOs {
            label: OsLabel::Rhel,
            major_version: "8".to_string(),
            arch: Arch::X86_64,
        };
        assert_eq!(
            host.installer_filter(None),
            "os:\"*RHEL*\"+os_version:\"*8*\"+os_version:!~\"arm64\"+os_version:!~\"zLinux\""
        );
    }

    #[test]
    fn test_installer_filter_amazon_exact_with_pin() {
        let host = HostOs {
            label: OsLabel::AmazonLinux,
            major_version: "2".to_string(),
            arch: Arch::Aarch64,
        };
        assert_eq!(
            host.installer_filter(Some("7.10.16303")),
            "os:\"Amazon Linux\"+os_version:\"2\"+os_version:~\"arm64\"+version:\"7.10.16303\""
        );
    }
}
