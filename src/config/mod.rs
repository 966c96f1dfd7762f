//! Configuration resolution
//!
//! Turns the raw [`SensorArgs`] into an immutable [`Settings`] snapshot.
//! Every enumerated value is checked against its allow-list here, before the
//! installer touches the network or the package manager.

pub mod options;

use std::path::PathBuf;

use crate::cli::SensorArgs;
use crate::error::{FalconError, Result};

pub use options::{Backend, Billing, Cloud, Trace};

/// Largest accepted `FALCON_SENSOR_VERSION_DECREMENT`.
pub const MAX_VERSION_DECREMENT: u8 = 5;

/// What a run of the installer does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Download, install, register and start the sensor
    Install,
    /// Download and install without registering
    InstallOnly,
    /// Download the installer into the download path
    DownloadOnly,
    /// Remove the installed sensor
    Uninstall,
    /// Print an API access token
    PrintToken,
}

impl Mode {
    /// Whether this mode changes system packages or services.
    pub fn needs_root(self) -> bool {
        matches!(self, Mode::Install | Mode::InstallOnly | Mode::Uninstall)
    }
}

/// Where the API bearer token comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Token supplied directly; region must be configured
    AccessToken(String),
    /// OAuth client exchanged at the token endpoint
    Client {
        client_id: String,
        client_secret: String,
    },
    /// Client id/secret fetched from AWS SSM Parameter Store
    ParameterStore,
}

/// Sensor proxy settings (`FALCON_APD`, `FALCON_APH`, `FALCON_APP`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proxy {
    pub disabled: Option<bool>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Proxy {
    /// Proxy URL for API traffic, unless the proxy is disabled.
    pub fn url(&self) -> Option<String> {
        if self.disabled == Some(true) {
            return None;
        }
        let host = self.host.as_deref()?;
        let base = if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{host}")
        };
        Some(match self.port {
            Some(port) => format!("{base}:{port}"),
            None => base,
        })
    }
}

/// Validated configuration for one installer run
#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: Mode,
    pub credentials: Credentials,
    pub cloud: Option<Cloud>,
    pub cid: Option<String>,
    pub version_decrement: u8,
    pub provisioning_token: Option<String>,
    pub update_policy: Option<String>,
    pub tags: Option<String>,
    pub proxy: Proxy,
    pub billing: Option<Billing>,
    pub backend: Option<Backend>,
    pub trace: Option<Trace>,
    pub download_path: PathBuf,
    pub allow_legacy_tls: bool,
    pub gpg_key: Option<PathBuf>,
    pub api_base_url: Option<String>,
    /// Non-fatal adjustments made while resolving, shown to the user
    pub warnings: Vec<String>,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Unsigned decimal digits only; `str::parse` would also take a leading `+`.
fn is_decimal(raw: &str) -> bool {
    raw.bytes().all(|b| b.is_ascii_digit())
}

fn parse_decrement(raw: Option<&String>) -> Result<u8> {
    let Some(raw) = non_empty(raw) else {
        return Ok(0);
    };
    if !is_decimal(&raw) {
        return Err(FalconError::InvalidVersionDecrement { value: raw });
    }
    match raw.parse::<u8>() {
        Ok(value) if value <= MAX_VERSION_DECREMENT => Ok(value),
        _ => Err(FalconError::InvalidVersionDecrement { value: raw }),
    }
}

fn parse_port(raw: Option<&String>) -> Result<Option<u16>> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    if !is_decimal(&raw) {
        return Err(FalconError::InvalidProxyPort { value: raw });
    }
    match raw.parse::<u16>() {
        Ok(port) if port > 0 => Ok(Some(port)),
        _ => Err(FalconError::InvalidProxyPort { value: raw }),
    }
}

fn resolve_mode(args: &SensorArgs) -> Result<Mode> {
    let requested: Vec<(&str, Mode)> = [
        (args.uninstall, "FALCON_UNINSTALL", Mode::Uninstall),
        (args.get_access_token, "GET_ACCESS_TOKEN", Mode::PrintToken),
        (args.download_only, "FALCON_DOWNLOAD_ONLY", Mode::DownloadOnly),
        (args.install_only, "FALCON_INSTALL_ONLY", Mode::InstallOnly),
    ]
    .into_iter()
    .filter(|(enabled, _, _)| *enabled)
    .map(|(_, name, mode)| (name, mode))
    .collect();

    match requested.as_slice() {
        [] => Ok(Mode::Install),
        [(_, mode)] => Ok(*mode),
        many => Err(FalconError::ConflictingOptions {
            message: format!(
                "{} cannot be combined",
                many.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", ")
            ),
        }),
    }
}

fn resolve_credentials(args: &SensorArgs, mode: Mode, cloud: Option<Cloud>) -> Result<Credentials> {
    if let Some(token) = non_empty(args.access_token.as_ref()) {
        if cloud.is_none() && mode != Mode::Uninstall {
            return Err(FalconError::CloudRequired);
        }
        return Ok(Credentials::AccessToken(token));
    }

    match (
        non_empty(args.client_id.as_ref()),
        non_empty(args.client_secret.as_ref()),
    ) {
        (Some(client_id), Some(client_secret)) => Ok(Credentials::Client {
            client_id,
            client_secret,
        }),
        (None, None) => Ok(Credentials::ParameterStore),
        _ if mode == Mode::Uninstall => Ok(Credentials::ParameterStore),
        _ => Err(FalconError::MissingCredentials),
    }
}

impl Settings {
    /// Validate raw arguments into settings.
    ///
    /// Fails on the first invalid value; never performs I/O.
    pub fn resolve(args: &SensorArgs) -> Result<Self> {
        let cloud = non_empty(args.cloud.as_ref())
            .map(|v| Cloud::parse(&v))
            .transpose()?;
        let backend = non_empty(args.backend.as_ref())
            .map(|v| Backend::parse(&v))
            .transpose()?;
        let billing = non_empty(args.billing.as_ref())
            .map(|v| Billing::parse(&v))
            .transpose()?;
        let trace = non_empty(args.trace.as_ref())
            .map(|v| Trace::parse(&v))
            .transpose()?;
        let apd = non_empty(args.apd.as_ref())
            .map(|v| options::parse_strict_bool("FALCON_APD", &v))
            .transpose()?;
        let port = parse_port(args.app.as_ref())?;
        let mut version_decrement = parse_decrement(args.sensor_version_decrement.as_ref())?;

        let mode = resolve_mode(args)?;
        let credentials = resolve_credentials(args, mode, cloud)?;

        let mut warnings = Vec::new();
        let update_policy = non_empty(args.update_policy.as_ref());
        if version_decrement > 0 && update_policy.is_some() {
            warnings.push(format!(
                "FALCON_SENSOR_VERSION_DECREMENT={version_decrement} is ignored because \
                 FALCON_SENSOR_UPDATE_POLICY_NAME is set"
            ));
            version_decrement = 0;
        }

        Ok(Self {
            mode,
            credentials,
            cloud,
            cid: non_empty(args.cid.as_ref()),
            version_decrement,
            provisioning_token: non_empty(args.provisioning_token.as_ref()),
            update_policy,
            tags: non_empty(args.tags.as_ref()),
            proxy: Proxy {
                disabled: apd,
                host: non_empty(args.aph.as_ref()),
                port,
            },
            billing,
            backend,
            trace,
            download_path: args
                .download_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            allow_legacy_tls: args.allow_legacy_curl,
            gpg_key: args.gpg_key.clone(),
            api_base_url: non_empty(args.api_base_url.as_ref())
                .map(|url| url.trim_end_matches('/').to_string()),
            warnings,
        })
    }
}
