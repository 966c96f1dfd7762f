use std::path::PathBuf;

use clap::Args;
use clap::builder::BoolishValueParser;

/// Sensor installation and registration options
///
/// Enumerated values stay raw strings so that validation happens in one place
/// and reports the offending value.
#[derive(Args, Debug, Default, Clone)]
pub struct SensorArgs {
    /// Falcon API OAuth client id
    #[arg(long, env = "FALCON_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// Falcon API OAuth client secret
    #[arg(long, env = "FALCON_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Pre-issued Falcon API bearer token (requires --cloud)
    #[arg(long, env = "FALCON_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Falcon cloud region (us-1, us-2, eu-1, us-gov-1)
    #[arg(long, env = "FALCON_CLOUD")]
    pub cloud: Option<String>,

    /// Customer ID; looked up through the API when omitted
    #[arg(long, env = "FALCON_CID")]
    pub cid: Option<String>,

    /// Install the Nth newest sensor version instead of the newest (0-5)
    #[arg(long, env = "FALCON_SENSOR_VERSION_DECREMENT")]
    pub sensor_version_decrement: Option<String>,

    /// Provisioning token for sensor registration
    #[arg(long, env = "FALCON_PROVISIONING_TOKEN", hide_env_values = true)]
    pub provisioning_token: Option<String>,

    /// Sensor update policy whose pinned version is installed
    #[arg(long = "update-policy", env = "FALCON_SENSOR_UPDATE_POLICY_NAME")]
    pub update_policy: Option<String>,

    /// Comma separated sensor grouping tags
    #[arg(long, env = "FALCON_TAGS")]
    pub tags: Option<String>,

    /// Disable the sensor proxy (true, false)
    #[arg(long, env = "FALCON_APD")]
    pub apd: Option<String>,

    /// Proxy host
    #[arg(long, env = "FALCON_APH")]
    pub aph: Option<String>,

    /// Proxy port
    #[arg(long, env = "FALCON_APP")]
    pub app: Option<String>,

    /// Billing mode (default, metered)
    #[arg(long, env = "FALCON_BILLING")]
    pub billing: Option<String>,

    /// Sensor backend (auto, bpf, kernel)
    #[arg(long, env = "FALCON_BACKEND")]
    pub backend: Option<String>,

    /// Sensor trace level (none, err, warn, info, debug)
    #[arg(long, env = "FALCON_TRACE")]
    pub trace: Option<String>,

    /// Remove the installed sensor and exit
    #[arg(long, env = "FALCON_UNINSTALL", value_parser = BoolishValueParser::new())]
    pub uninstall: bool,

    /// Install the sensor without registering or starting it
    #[arg(long, env = "FALCON_INSTALL_ONLY", value_parser = BoolishValueParser::new())]
    pub install_only: bool,

    /// Download the installer and exit
    #[arg(long, env = "FALCON_DOWNLOAD_ONLY", value_parser = BoolishValueParser::new())]
    pub download_only: bool,

    /// Directory for --download-only (defaults to the current directory)
    #[arg(long, env = "FALCON_DOWNLOAD_PATH")]
    pub download_path: Option<PathBuf>,

    /// Accept HTTP client stacks without TLS 1.2 support
    #[arg(long, env = "ALLOW_LEGACY_CURL", value_parser = BoolishValueParser::new())]
    pub allow_legacy_curl: bool,

    /// Print a Falcon API access token and exit
    #[arg(long, env = "GET_ACCESS_TOKEN", value_parser = BoolishValueParser::new())]
    pub get_access_token: bool,

    /// Package signing key imported before RPM installs
    #[arg(long, env = "FALCON_GPG_KEY")]
    pub gpg_key: Option<PathBuf>,

    /// Override the API base URL derived from the cloud region
    #[arg(long, env = "FALCON_API_BASE_URL", hide = true)]
    pub api_base_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::super::Cli;
    use clap::Parser;

    #[test]
    fn test_cli_parsing_sensor_flags() {
        let cli = Cli::try_parse_from([
            "falcon-linux-install",
            "--cloud",
            "eu-1",
            "--backend",
            "kernel",
            "--tags",
            "web,prod",
            "--sensor-version-decrement",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.sensor.cloud.as_deref(), Some("eu-1"));
        assert_eq!(cli.sensor.backend.as_deref(), Some("kernel"));
        assert_eq!(cli.sensor.tags.as_deref(), Some("web,prod"));
        assert_eq!(cli.sensor.sensor_version_decrement.as_deref(), Some("2"));
        assert!(!cli.sensor.uninstall);
    }

    #[test]
    fn test_cli_parsing_invalid_values_are_deferred() {
        // Enumerated options are validated by Settings::resolve, not by clap.
        let cli =
            Cli::try_parse_from(["falcon-linux-install", "--backend", "xyz", "--apd", "maybe"])
                .unwrap();
        assert_eq!(cli.sensor.backend.as_deref(), Some("xyz"));
        assert_eq!(cli.sensor.apd.as_deref(), Some("maybe"));
    }

    #[test]
    fn test_cli_parsing_mode_flags() {
        let cli = Cli::try_parse_from([
            "falcon-linux-install",
            "--download-only",
            "--download-path",
            "/srv/pkgs",
        ])
        .unwrap();
        assert!(cli.sensor.download_only);
        assert_eq!(
            cli.sensor.download_path,
            Some(std::path::PathBuf::from("/srv/pkgs"))
        );
    }

    #[test]
    #[serial_test::serial]
    fn test_cli_flag_overrides_env() {
        unsafe {
            std::env::set_var("FALCON_TAGS", "from-env");
        }
        let from_env = Cli::try_parse_from(["falcon-linux-install"]).unwrap();
        let from_flag =
            Cli::try_parse_from(["falcon-linux-install", "--tags", "from-flag"]).unwrap();
        unsafe {
            std::env::remove_var("FALCON_TAGS");
        }
        assert_eq!(from_env.sensor.tags.as_deref(), Some("from-env"));
        assert_eq!(from_flag.sensor.tags.as_deref(), Some("from-flag"));
    }

    #[test]
    fn test_cli_parsing_update_policy() {
        let cli =
            Cli::try_parse_from(["falcon-linux-install", "--update-policy", "platform_default"])
                .unwrap();
        assert_eq!(cli.sensor.update_policy.as_deref(), Some("platform_default"));
    }
}
