//! CPU architecture classification

use std::fmt;

use crate::error::{FalconError, Result};

/// Instruction set architectures with published sensor builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    Aarch64,
    S390x,
}

impl Arch {
    /// Classify a `uname -m` style machine name.
    pub fn from_machine(machine: &str) -> Result<Self> {
        match machine.trim() {
            "x86_64" | "amd64" => Ok(Arch::X86_64),
            "aarch64" | "arm64" => Ok(Arch::Aarch64),
            "s390x" => Ok(Arch::S390x),
            other => Err(FalconError::UnsupportedArch {
                arch: other.to_string(),
            }),
        }
    }

    /// Architecture this binary runs on.
    pub fn current() -> Result<Self> {
        Self::from_machine(std::env::consts::ARCH)
    }

    /// Catalog filter fragment selecting builds for this architecture.
    ///
    /// ARM and zLinux builds carry their ISA in `os_version`; x86_64 is
    /// whatever is left.
    pub fn filter_fragment(self) -> &'static str {
        match self {
            Arch::X86_64 => "+os_version:!~\"arm64\"+os_version:!~\"zLinux\"",
            Arch::Aarch64 => "+os_version:~\"arm64\"",
            Arch::S390x => "+os_version:~\"zLinux\"",
        }
    }

    /// Platform of the update-policy variant that applies to this architecture.
    pub fn policy_variant(self) -> Option<&'static str> {
        match self {
            Arch::Aarch64 => Some("LinuxArm64"),
            Arch::X86_64 | Arch::S390x => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
            Arch::S390x => "s390x",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
