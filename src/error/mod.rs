//! Error types and handling for the Falcon installer
//!
//! Uses `thiserror` for error definitions and `miette` for diagnostics.
//!
//! Variants are grouped by the step of the workflow that raises them:
//! configuration, OS identification, the vendor API, HTTP transport,
//! package installation and sensor registration.
//! [`transport`] translates `reqwest` failures into the transport variants.

pub mod transport;


use miette::Diagnostic;
use thiserror::Error;

/// Exit code for every fatal error outside the uninstall branch.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code reserved for a failed sensor removal.
pub const EXIT_UNINSTALL_FAILURE: i32 = 2;

/// Main error type for installer operations
#[derive(Error, Diagnostic, Debug)]
pub enum FalconError {
    // Configuration errors
    #[error("Invalid {variable}: '{value}'")]
    #[diagnostic(code(falcon::config::invalid_option), help("Valid values: {allowed}"))]
    InvalidOption {
        variable: String,
        value: String,
        allowed: String,
    },

    #[error("Invalid FALCON_SENSOR_VERSION_DECREMENT: '{value}'")]
    #[diagnostic(
        code(falcon::config::invalid_decrement),
        help("Must be an integer between 0 and 5")
    )]
    InvalidVersionDecrement { value: String },

    #[error("Invalid FALCON_APP: '{value}'")]
    #[diagnostic(
        code(falcon::config::invalid_port),
        help("Must be a TCP port number between 1 and 65535")
    )]
    InvalidProxyPort { value: String },

    #[error("FALCON_CLOUD must be set when using FALCON_ACCESS_TOKEN")]
    #[diagnostic(
        code(falcon::config::cloud_required),
        help("Valid values: us-1, us-2, eu-1, us-gov-1")
    )]
    CloudRequired,

    #[error("Missing FALCON_CLIENT_ID and FALCON_CLIENT_SECRET")]
    #[diagnostic(
        code(falcon::config::missing_credentials),
        help(
            "Set FALCON_CLIENT_ID and FALCON_CLIENT_SECRET, or FALCON_ACCESS_TOKEN together with FALCON_CLOUD"
        )
    )]
    MissingCredentials,

    #[error("Conflicting options: {message}")]
    #[diagnostic(code(falcon::config::conflict))]
    ConflictingOptions { message: String },

    #[error("This operation must be run as root")]
    #[diagnostic(code(falcon::config::not_root), help("Re-run the installer with sudo"))]
    NotRoot,

    // OS identification errors
    #[error("Unable to determine the operating system")]
    #[diagnostic(
        code(falcon::platform::os_release_unavailable),
        help("Neither /etc/os-release nor lsb_release could be read")
    )]
    OsReleaseUnavailable,

    #[error("Unrecognized OS: {name}")]
    #[diagnostic(
        code(falcon::platform::unsupported_os),
        help("Supported: Amazon Linux, RHEL family, Debian, Ubuntu, SLES")
    )]
    UnsupportedOs { name: String },

    #[error("Unrecognized OS architecture: {arch}")]
    #[diagnostic(
        code(falcon::platform::unsupported_arch),
        help("Supported: x86_64, aarch64, s390x")
    )]
    UnsupportedArch { arch: String },

    #[error("No supported package manager found")]
    #[diagnostic(
        code(falcon::platform::no_package_manager),
        help("One of dnf, yum, zypper or apt-get must be on PATH")
    )]
    NoPackageManager,

    // Vendor API errors
    #[error("Unable to obtain CrowdStrike Falcon OAuth Token: {reason}")]
    #[diagnostic(
        code(falcon::api::token_failed),
        help("Double check your API credentials and/or region")
    )]
    TokenRequestFailed { reason: String },

    #[error("Access denied: Please make sure that your Falcon API credentials allow {scope}")]
    #[diagnostic(code(falcon::api::access_denied))]
    AccessDenied { scope: String },

    #[error("Invalid Access Token: the API rejected the bearer token")]
    #[diagnostic(
        code(falcon::api::invalid_bearer_token),
        help("Request a fresh token or use FALCON_CLIENT_ID and FALCON_CLIENT_SECRET")
    )]
    InvalidBearerToken,

    #[error("Unrecognized region reported by the API: {region}")]
    #[diagnostic(code(falcon::api::unknown_region))]
    UnknownRegion { region: String },

    #[error("API request to {endpoint} failed: {reason}")]
    #[diagnostic(code(falcon::api::request_failed))]
    ApiRequestFailed { endpoint: String, reason: String },

    #[error("Failed to parse API response from {endpoint}: {reason}")]
    #[diagnostic(code(falcon::api::parse_failed))]
    ResponseParseFailed { endpoint: String, reason: String },

    #[error("Sensor update policy '{name}' not found or has no sensor version")]
    #[diagnostic(
        code(falcon::api::policy_not_found),
        help("Check FALCON_SENSOR_UPDATE_POLICY_NAME against the Falcon console")
    )]
    PolicyNotFound { name: String },

    #[error("No sensor installer found for filter: {filter}")]
    #[diagnostic(code(falcon::api::no_installer))]
    NoInstallerFound { filter: String },

    #[error("Sensor version decrement {decrement} is out of range: only {available} installers available")]
    #[diagnostic(
        code(falcon::api::decrement_out_of_range),
        help("Lower FALCON_SENSOR_VERSION_DECREMENT")
    )]
    DecrementOutOfRange { decrement: u8, available: usize },

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    #[diagnostic(code(falcon::api::checksum_mismatch))]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Unable to determine the Falcon CID")]
    #[diagnostic(
        code(falcon::api::cid_not_found),
        help("Set FALCON_CID or grant the API client Sensor Download [read]")
    )]
    CidNotFound,

    #[error("AWS Parameter Store credentials unavailable: {reason}")]
    #[diagnostic(code(falcon::api::parameter_store))]
    ParameterStoreUnavailable { reason: String },

    // HTTP transport errors
    #[error("Operation timed out: {url}")]
    #[diagnostic(
        code(falcon::transport::timeout),
        help("Check network connectivity to the Falcon API and any firewall rules")
    )]
    RequestTimedOut { url: String },

    #[error("Couldn't resolve proxy: {proxy}")]
    #[diagnostic(
        code(falcon::transport::proxy),
        help("Check FALCON_APH and FALCON_APP, or set FALCON_APD=true to bypass the proxy")
    )]
    ProxyUnresolved { proxy: String },

    #[error("Failed to connect to host: {url}")]
    #[diagnostic(
        code(falcon::transport::connect),
        help("Check DNS resolution and outbound HTTPS access to the Falcon API")
    )]
    ConnectionFailed { url: String },

    #[error("Failed writing received data to {path}: {reason}")]
    #[diagnostic(
        code(falcon::transport::write),
        help("Check free disk space and permissions on the download directory")
    )]
    DownloadWriteFailed { path: String, reason: String },

    #[error("HTTP request to {url} failed: {reason}")]
    #[diagnostic(code(falcon::transport::http))]
    HttpRequestFailed { url: String, reason: String },

    // Package installation errors
    #[error("Failed to install {package}: {reason}")]
    #[diagnostic(code(falcon::installer::install_failed))]
    PackageInstallFailed { package: String, reason: String },

    #[error("Failed to remove falcon-sensor: {reason}")]
    #[diagnostic(code(falcon::installer::remove_failed))]
    PackageRemoveFailed { reason: String },

    #[error("Failed to import signing key {path}: {reason}")]
    #[diagnostic(code(falcon::installer::key_import_failed))]
    SigningKeyImportFailed { path: String, reason: String },

    // Sensor registration errors
    #[error("Failed to configure the Falcon sensor: {reason}")]
    #[diagnostic(code(falcon::sensor::registration_failed))]
    RegistrationFailed { reason: String },

    #[error("Failed to restart falcon-sensor: {reason}")]
    #[diagnostic(code(falcon::sensor::restart_failed))]
    ServiceRestartFailed { reason: String },

    // File system errors
    #[error("IO error: {message}")]
    #[diagnostic(code(falcon::fs::io_error))]
    IoError { message: String },
}

impl FalconError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            FalconError::PackageRemoveFailed { .. } => EXIT_UNINSTALL_FAILURE,
            _ => EXIT_FAILURE,
        }
    }
}

impl From<std::io::Error> for FalconError {
    fn from(err: std::io::Error) -> Self {
        FalconError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FalconError {
    fn from(err: serde_json::Error) -> Self {
        FalconError::ResponseParseFailed {
            endpoint: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for FalconError {
    fn from(err: reqwest::Error) -> Self {
        transport::translate(&err, None)
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, FalconError>;
