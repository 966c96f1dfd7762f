//! Enumerated configuration options and their allow-lists

use std::fmt;

use crate::error::{FalconError, Result};

/// Declares an option enum backed by a fixed allow-list of strings.
///
/// Generates `ALL`, `as_str`, `Display` and a `parse` constructor that
/// rejects anything outside the list with [`FalconError::InvalidOption`].
macro_rules! allow_list {
    (
        $(#[$meta:meta])*
        $name:ident, $variable:literal {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every accepted value, in documentation order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            /// Parse a raw value, rejecting anything outside the allow-list.
            pub fn parse(value: &str) -> Result<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str() == value)
                    .ok_or_else(|| FalconError::InvalidOption {
                        variable: $variable.to_string(),
                        value: value.to_string(),
                        allowed: Self::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

allow_list! {
    /// Falcon cloud region hosting the tenant
    Cloud, "FALCON_CLOUD" {
        Us1 => "us-1",
        Us2 => "us-2",
        Eu1 => "eu-1",
        UsGov1 => "us-gov-1",
    }
}

allow_list! {
    /// Sensor backend passed to falconctl
    Backend, "FALCON_BACKEND" {
        Auto => "auto",
        Bpf => "bpf",
        Kernel => "kernel",
    }
}

allow_list! {
    /// Billing mode passed to falconctl
    Billing, "FALCON_BILLING" {
        Default => "default",
        Metered => "metered",
    }
}

allow_list! {
    /// Sensor trace level passed to falconctl
    Trace, "FALCON_TRACE" {
        None => "none",
        Err => "err",
        Warn => "warn",
        Info => "info",
        Debug => "debug",
    }
}

impl Cloud {
    /// API host serving this cloud.
    pub fn api_host(self) -> &'static str {
        match self {
            Cloud::Us1 => "api.crowdstrike.com",
            Cloud::Us2 => "api.us-2.crowdstrike.com",
            Cloud::Eu1 => "api.eu-1.crowdstrike.com",
            Cloud::UsGov1 => "api.laggar.gcw.crowdstrike.com",
        }
    }

    pub fn base_url(self) -> String {
        format!("https://{}", self.api_host())
    }

    /// Map the region reported in the `X-Cs-Region` token response header.
    pub fn from_region_header(region: &str) -> Result<Self> {
        let region = region.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|cloud| cloud.as_str() == region)
            .ok_or(FalconError::UnknownRegion { region })
    }
}

/// Parse the strict `true|false` flag used for `FALCON_APD`.
pub fn parse_strict_bool(variable: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(FalconError::InvalidOption {
            variable: variable.to_string(),
            value: value.to_string(),
            allowed: "true, false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse_valid() {
        assert_eq!(Backend::parse("kernel").unwrap(), Backend::Kernel);
        assert_eq!(Backend::parse("bpf").unwrap(), Backend::Bpf);
        assert_eq!(Backend::parse("auto").unwrap(), Backend::Auto);
    }

    #[test]
    fn test_backend_parse_invalid_names_variable_and_value() {
        let err = Backend::parse("xyz").unwrap_err();
        match err {
            FalconError::InvalidOption {
                variable,
                value,
                allowed,
            } => {
                assert_eq!(variable, "FALCON_BACKEND");
                assert_eq!(value, "xyz");
                assert_eq!(allowed, "auto, bpf, kernel");
            }
            other => panic!("Expected InvalidOption, got {other:?}"),
        }
    }

    #[test]
    fn test_option_values_are_case_sensitive() {
        assert!(Cloud::parse("US-1").is_err());
        assert!(Trace::parse("Debug").is_err());
    }

    #[test]
    fn test_every_allow_list_round_trips_through_display() {
        for cloud in Cloud::ALL {
            assert_eq!(Cloud::parse(&cloud.to_string()).unwrap(), *cloud);
        }
        for trace in Trace::ALL {
            assert_eq!(Trace::parse(trace.as_str()).unwrap(), *trace);
        }
        for billing in Billing::ALL {
            assert_eq!(Billing::parse(billing.as_str()).unwrap(), *billing);
        }
    }

    #[test]
    fn test_cloud_api_hosts() {
        assert_eq!(Cloud::Us1.base_url(), "https://api.crowdstrike.com");
        assert_eq!(Cloud::Us2.api_host(), "api.us-2.crowdstrike.com");
        assert_eq!(Cloud::Eu1.api_host(), "api.eu-1.crowdstrike.com");
        assert_eq!(Cloud::UsGov1.api_host(), "api.laggar.gcw.crowdstrike.com");
    }

    #[test]
    fn test_cloud_from_region_header() {
        assert_eq!(Cloud::from_region_header("us-2").unwrap(), Cloud::Us2);
        assert_eq!(Cloud::from_region_header(" EU-1\r").unwrap(), Cloud::Eu1);
        assert!(matches!(
            Cloud::from_region_header("ap-9"),
            Err(FalconError::UnknownRegion { .. })
        ));
    }

    #[test]
    fn test_parse_strict_bool() {
        assert!(parse_strict_bool("FALCON_APD", "true").unwrap());
        assert!(!parse_strict_bool("FALCON_APD", "FALSE").unwrap());
        assert!(parse_strict_bool("FALCON_APD", "yes").is_err());
        assert!(parse_strict_bool("FALCON_APD", "").is_err());
    }
}
