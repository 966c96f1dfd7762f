//! Installer catalog client
//!
//! Resolves the sensor version pinned by an update policy, lists installers
//! matching the host, picks one by recency and downloads it.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{FalconError, Result, transport};
use crate::platform::{Arch, HostOs};
use crate::progress::DownloadProgress;

use super::aws::hex;
use super::{ApiClient, SCOPE_SENSOR_DOWNLOAD, SCOPE_UPDATE_POLICY};

pub const POLICY_PATH: &str = "/policy/combined/sensor-update/v2";
pub const INSTALLERS_PATH: &str = "/sensors/combined/installers/v1";
pub const DOWNLOAD_PATH: &str = "/sensors/entities/download-installer/v1";

/// One entry of the installer catalog
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Installer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub sha256: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub os_version: String,
}

impl Installer {
    /// File name the installer is saved under.
    pub fn file_name(&self) -> String {
        if self.file_type.is_empty() {
            "falcon-sensor".to_string()
        } else {
            format!("falcon-sensor.{}", self.file_type)
        }
    }
}

#[derive(Debug, Deserialize)]
struct InstallersResponse {
    #[serde(default)]
    resources: Vec<Installer>,
}

/// Extract the pinned sensor version from an update policy query result.
///
/// ARM hosts read the policy's `LinuxArm64` variant; everything else reads
/// the main setting.
pub fn policy_version(response: &Value, arch: Arch) -> Option<String> {
    let settings = response.get("resources")?.get(0)?.get("settings")?;
    let version = match arch.policy_variant() {
        Some(platform) => settings
            .get("variants")?
            .as_array()?
            .iter()
            .find(|variant| variant.get("platform").and_then(Value::as_str) == Some(platform))?
            .get("sensor_version")?,
        None => settings.get("sensor_version")?,
    };
    version
        .as_str()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Look up the sensor version pinned by the named update policy.
pub fn pinned_version(api: &ApiClient, policy_name: &str, arch: Arch) -> Result<String> {
    let filter = format!("platform_name:\"Linux\"+name.raw:\"{policy_name}\"");
    let response = api.get_json(POLICY_PATH, &[("filter", &filter)], SCOPE_UPDATE_POLICY)?;
    let version = policy_version(&response, arch).ok_or_else(|| FalconError::PolicyNotFound {
        name: policy_name.to_string(),
    })?;
    tracing::info!(policy = %policy_name, %version, "Sensor version pinned by update policy");
    Ok(version)
}

/// List installers for the host, newest first.
pub fn list_installers(
    api: &ApiClient,
    host: &HostOs,
    pinned_version: Option<&str>,
) -> Result<(String, Vec<Installer>)> {
    let filter = host.installer_filter(pinned_version);
    let response = api.get_json(
        INSTALLERS_PATH,
        &[("sort", "version|desc"), ("filter", &filter)],
        SCOPE_SENSOR_DOWNLOAD,
    )?;
    let parsed: InstallersResponse =
        serde_json::from_value(response).map_err(|e| FalconError::ResponseParseFailed {
            endpoint: INSTALLERS_PATH.to_string(),
            reason: e.to_string(),
        })?;
    tracing::debug!(%filter, count = parsed.resources.len(), "Installers listed");
    Ok((filter, parsed.resources))
}

/// Pick the installer `decrement` versions back from the newest.
pub fn select(installers: Vec<Installer>, decrement: u8, filter: &str) -> Result<Installer> {
    if installers.is_empty() {
        return Err(FalconError::NoInstallerFound {
            filter: filter.to_string(),
        });
    }
    let available = installers.len();
    installers
        .into_iter()
        .nth(usize::from(decrement))
        .ok_or(FalconError::DecrementOutOfRange {
            decrement,
            available,
        })
}

/// Writer that hashes everything passing through it
struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Download `installer` into `dir`, verifying its SHA-256.
///
/// The bytes land in a temporary file beside the destination and are moved
/// into place only once the checksum matches; on any failure nothing is left
/// in `dir`. Returns the path of the downloaded package.
pub fn download(api: &ApiClient, installer: &Installer, dir: &Path) -> Result<PathBuf> {
    let destination = dir.join(installer.file_name());
    let response = api.get_stream(
        DOWNLOAD_PATH,
        &[("id", &installer.sha256)],
        SCOPE_SENSOR_DOWNLOAD,
    )?;

    let partial = tempfile::Builder::new()
        .prefix(".falcon-sensor-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| transport::write_failed(&destination, &e))?;

    let progress = DownloadProgress::new(response.content_length(), &installer.file_name());
    let mut writer = HashingWriter {
        inner: partial,
        hasher: Sha256::new(),
    };

    let mut reader = progress.wrap_read(response);
    match io::copy(&mut reader, &mut writer) {
        Ok(bytes) => progress.finish(bytes),
        Err(e) => {
            progress.abandon();
            // Read side failures surface as io errors wrapping the transport error.
            return Err(match e.get_ref().and_then(|inner| inner.downcast_ref::<reqwest::Error>()) {
                Some(http_err) => transport::translate(http_err, api.proxy()),
                None => transport::write_failed(&destination, &e),
            });
        }
    }
    writer
        .flush()
        .map_err(|e| transport::write_failed(&destination, &e))?;

    let HashingWriter { inner: partial, hasher } = writer;
    let actual = hex(&hasher.finalize());
    if !actual.eq_ignore_ascii_case(&installer.sha256) {
        return Err(FalconError::ChecksumMismatch {
            path: destination.display().to_string(),
            expected: installer.sha256.clone(),
            actual,
        });
    }

    partial
        .persist(&destination)
        .map_err(|e| transport::write_failed(&destination, &e.error))?;

    tracing::info!(path = %destination.display(), version = %installer.version, "Installer downloaded");
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::MockApi;
    use crate::api::{Session, http_client};
    use crate::cli::SensorArgs;
    use crate::config::Cloud;
    use crate::platform::OsLabel;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn installer(version: &str, sha: &str) -> Installer {
        Installer {
            name: format!("falcon-sensor-{version}.el8.x86_64.rpm"),
            version: version.to_string(),
            sha256: sha.to_string(),
            file_type: "rpm".to_string(),
            os: "RHEL/CentOS/Oracle".to_string(),
            os_version: "8".to_string(),
        }
    }

    fn client(api: &MockApi) -> ApiClient {
        let settings = api.settings(SensorArgs {
            access_token: Some("t".to_string()),
            cloud: Some("us-1".to_string()),
            ..SensorArgs::default()
        });
        let session = Session {
            token: "t".to_string(),
            cloud: Cloud::Us1,
            base_url: api.uri(),
        };
        ApiClient::new(http_client(&settings).unwrap(), session, &settings)
    }

    fn rhel8() -> HostOs {
        HostOs {
            label: OsLabel::Rhel,
            major_version: "8".to_string(),
            arch: Arch::X86_64,
        }
    }

    #[test]
    fn test_select_newest_by_default() {
        let list = vec![installer("7.12", "a"), installer("7.11", "b")];
        assert_eq!(select(list, 0, "f").unwrap().version, "7.12");
    }

    #[test]
    fn test_select_with_decrement() {
        let list = vec![
            installer("7.12", "a"),
            installer("7.11", "b"),
            installer("7.10", "c"),
        ];
        assert_eq!(select(list, 2, "f").unwrap().sha256, "c");
    }

    #[test]
    fn test_select_decrement_out_of_range() {
        let list = vec![installer("7.12", "a")];
        assert!(matches!(
            select(list, 1, "f"),
            Err(FalconError::DecrementOutOfRange {
                decrement: 1,
                available: 1
            })
        ));
    }

    #[test]
    fn test_select_empty_catalog() {
        let err = select(Vec::new(), 0, "os:\"Ubuntu\"").unwrap_err();
        assert!(matches!(err, FalconError::NoInstallerFound { .. }));
        assert!(err.to_string().contains("os:\"Ubuntu\""));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(installer("1", "a").file_name(), "falcon-sensor.rpm");
        let mut deb = installer("1", "a");
        deb.file_type = "deb".to_string();
        assert_eq!(deb.file_name(), "falcon-sensor.deb");
    }

    #[test]
    fn test_policy_version_x86_and_variants() {
        let response = json!({
            "resources": [{
                "name": "prod",
                "settings": {
                    "sensor_version": "7.11.16405",
                    "variants": [
                        {"platform": "LinuxArm64", "sensor_version": "7.11.16410"}
                    ]
                }
            }]
        });
        assert_eq!(
            policy_version(&response, Arch::X86_64).as_deref(),
            Some("7.11.16405")
        );
        assert_eq!(
            policy_version(&response, Arch::Aarch64).as_deref(),
            Some("7.11.16410")
        );
        assert_eq!(
            policy_version(&response, Arch::S390x).as_deref(),
            Some("7.11.16405")
        );
    }

    #[test]
    fn test_policy_version_missing_or_empty() {
        assert_eq!(policy_version(&json!({"resources": []}), Arch::X86_64), None);
        let disabled = json!({"resources": [{"settings": {"sensor_version": ""}}]});
        assert_eq!(policy_version(&disabled, Arch::X86_64), None);
    }

    #[test]
    fn test_pinned_version_query() {
        let api = MockApi::start();
        api.mount(
            Mock::given(method("GET"))
                .and(path(POLICY_PATH))
                .and(query_param(
                    "filter",
                    "platform_name:\"Linux\"+name.raw:\"prod\"",
                ))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "resources": [{"settings": {"sensor_version": "7.10.1"}}]
                }))),
        );
        assert_eq!(
            pinned_version(&client(&api), "prod", Arch::X86_64).unwrap(),
            "7.10.1"
        );
    }

    #[test]
    fn test_pinned_version_unknown_policy() {
        let api = MockApi::start();
        api.mount(
            Mock::given(method("GET"))
                .and(path(POLICY_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resources": []}))),
        );
        assert!(matches!(
            pinned_version(&client(&api), "missing", Arch::X86_64),
            Err(FalconError::PolicyNotFound { .. })
        ));
    }

    #[test]
    fn test_list_installers_sends_filter_and_sort() {
        let api = MockApi::start();
        let host = rhel8();
        api.mount(
            Mock::given(method("GET"))
                .and(path(INSTALLERS_PATH))
                .and(query_param("sort", "version|desc"))
                .and(query_param("filter", host.installer_filter(Some("7.10.1")).as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "resources": [
                        {"name": "a.rpm", "version": "7.10.1", "sha256": "aa", "file_type": "rpm"}
                    ]
                }))),
        );
        let (_, installers) = list_installers(&client(&api), &host, Some("7.10.1")).unwrap();
        assert_eq!(installers.len(), 1);
        assert_eq!(installers[0].sha256, "aa");
    }

    #[test]
    fn test_list_installers_access_denied() {
        let api = MockApi::start();
        api.mount(
            Mock::given(method("GET")).respond_with(
                ResponseTemplate::new(403).set_body_string(r#"{"errors":[{"message":"authorization failed"}]}"#),
            ),
        );
        let err = list_installers(&client(&api), &rhel8(), None).unwrap_err();
        assert!(matches!(err, FalconError::AccessDenied { .. }));
    }

    #[test]
    fn test_download_verifies_checksum() {
        let payload = b"fake rpm payload".to_vec();
        let sha = hex(&Sha256::digest(&payload));
        let api = MockApi::start();
        api.mount(
            Mock::given(method("GET"))
                .and(path(DOWNLOAD_PATH))
                .and(query_param("id", sha.as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone())),
        );

        let temp = TempDir::new().unwrap();
        let path = download(&client(&api), &installer("7.12", &sha), temp.path()).unwrap();
        assert_eq!(path, temp.path().join("falcon-sensor.rpm"));
        assert_eq!(std::fs::read(&path).unwrap(), payload);
    }

    #[test]
    fn test_download_checksum_mismatch() {
        let api = MockApi::start();
        api.mount(
            Mock::given(method("GET"))
                .and(path(DOWNLOAD_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tampered".to_vec())),
        );

        let temp = TempDir::new().unwrap();
        let expected = "0".repeat(64);
        let err = download(&client(&api), &installer("7.12", &expected), temp.path()).unwrap_err();
        match err {
            FalconError::ChecksumMismatch {
                expected: e,
                actual,
                ..
            } => {
                assert_eq!(e, expected);
                assert_eq!(actual, hex(&Sha256::digest(b"tampered")));
            }
            other => panic!("Expected ChecksumMismatch, got {other:?}"),
        }
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_download_http_failure_leaves_nothing() {
        let api = MockApi::start();
        api.mount(
            Mock::given(method("GET"))
                .and(path(DOWNLOAD_PATH))
                .respond_with(ResponseTemplate::new(500)),
        );

        let temp = TempDir::new().unwrap();
        let expected = "0".repeat(64);
        assert!(download(&client(&api), &installer("7.12", &expected), temp.path()).is_err());
        assert!(!temp.path().join("falcon-sensor.rpm").exists());
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_download_replaces_stale_file() {
        let payload = b"fresh".to_vec();
        let sha = hex(&Sha256::digest(&payload));
        let api = MockApi::start();
        api.mount(
            Mock::given(method("GET"))
                .and(path(DOWNLOAD_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone())),
        );

        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("falcon-sensor.rpm"), "stale").unwrap();
        let path = download(&client(&api), &installer("7.12", &sha), temp.path()).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), payload);
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_download_into_missing_directory_is_write_failure() {
        let payload = b"x".to_vec();
        let sha = hex(&Sha256::digest(&payload));
        let api = MockApi::start();
        api.mount(
            Mock::given(method("GET"))
                .and(path(DOWNLOAD_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(payload)),
        );

        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does/not/exist");
        let err = download(&client(&api), &installer("7.12", &sha), &missing).unwrap_err();
        assert!(matches!(err, FalconError::DownloadWriteFailed { .. }));
    }
}
