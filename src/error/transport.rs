//! Translation of HTTP transport failures into installer errors
//!
//! Mirrors the handful of failure classes an operator can act on: a timeout,
//! a proxy that cannot be reached, a host that refuses connections, and a
//! download that cannot be written to disk. Everything else is reported
//! verbatim.

use super::FalconError;

/// Translate a `reqwest` error, taking the configured proxy into account.
///
/// Connection failures are attributed to the proxy whenever one is in use,
/// since the client never talks to the API host directly in that case.
pub fn translate(err: &reqwest::Error, proxy: Option<&str>) -> FalconError {
    let url = err
        .url()
        .map_or_else(|| "<unknown>".to_string(), ToString::to_string);

    if err.is_timeout() {
        return FalconError::RequestTimedOut { url };
    }

    if err.is_connect() {
        return match proxy {
            Some(proxy) => FalconError::ProxyUnresolved {
                proxy: proxy.to_string(),
            },
            None => FalconError::ConnectionFailed { url },
        };
    }

    FalconError::HttpRequestFailed {
        url,
        reason: err.to_string(),
    }
}

/// Error for a failed write of downloaded bytes.
pub fn write_failed(path: &std::path::Path, err: &std::io::Error) -> FalconError {
    FalconError::DownloadWriteFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
