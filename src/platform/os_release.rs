//! Release metadata readers
//!
//! Reads `NAME` and `VERSION_ID` from an os-release file, falling back to
//! `lsb_release` on hosts that predate os-release.

use std::path::Path;
use std::process::Command;

/// Distribution name and version as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsRelease {
    pub name: String,
    pub version_id: String,
}

impl OsRelease {
    /// Major component of the version, e.g. `22` for `22.04`.
    pub fn major_version(&self) -> &str {
        self.version_id
            .split('.')
            .next()
            .unwrap_or(&self.version_id)
            .trim()
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Parse os-release `KEY=value` content.
///
/// Returns `None` when `NAME` is missing.
pub fn parse(content: &str) -> Option<OsRelease> {
    let mut name = None;
    let mut version_id = String::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            "NAME" => name = Some(unquote(value).to_string()),
            "VERSION_ID" => version_id = unquote(value).to_string(),
            _ => {}
        }
    }

    name.map(|name| OsRelease { name, version_id })
}

/// Read and parse an os-release file. `None` if absent or unreadable.
pub fn read(path: &Path) -> Option<OsRelease> {
    let content = std::fs::read_to_string(path).ok()?;
    parse(&content)
}

fn lsb_field(flag: &str) -> Option<String> {
    let output = Command::new("lsb_release").arg(flag).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Query `lsb_release` for distributor id and release.
pub fn from_lsb_release() -> Option<OsRelease> {
    let name = lsb_field("-si")?;
    let version_id = lsb_field("-sr").unwrap_or_default();
    tracing::debug!(%name, %version_id, "Release read from lsb_release");
    Some(OsRelease { name, version_id })
}
