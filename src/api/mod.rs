//! Falcon API access
//!
//! A thin blocking client around `reqwest`: bearer authentication, the
//! installer's User-Agent, optional proxy, transport error translation, and
//! the body checks the API uses to report authorization problems.
//!
//! - [`auth`]: token acquisition and region discovery
//! - [`aws`]: AWS Parameter Store as a source of API client credentials
//! - [`catalog`]: update policies, installer listing and download
//! - [`cid`]: customer ID lookup

pub mod auth;
pub mod aws;
pub mod catalog;
pub mod cid;

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::Value;
use url::Url;

use crate::config::Settings;
use crate::error::{FalconError, Result, transport};

pub use auth::Session;

/// User-Agent sent with every API request.
pub const USER_AGENT: &str = concat!("crowdstrike-falcon-scripts/", env!("CARGO_PKG_VERSION"));

/// Scope hint for sensor download endpoints.
pub const SCOPE_SENSOR_DOWNLOAD: &str = "sensor downloads (scope Sensor Download [read])";

/// Scope hint for the sensor update policy endpoint.
pub const SCOPE_UPDATE_POLICY: &str =
    "reading sensor update policies (scope Sensor update policies [read])";

/// Build the HTTP client used for all Falcon API traffic.
///
/// No request timeout is set: installers are tens of megabytes and the
/// transfer is bounded only by the connection itself.
pub fn http_client(settings: &Settings) -> Result<Client> {
    let mut builder = Client::builder().user_agent(USER_AGENT).timeout(None::<Duration>);

    if !settings.allow_legacy_tls {
        builder = builder.min_tls_version(reqwest::tls::Version::TLS_1_2);
    }

    if let Some(proxy_url) = settings.proxy.url() {
        tracing::debug!(proxy = %proxy_url, "Using proxy for API requests");
        let proxy = reqwest::Proxy::all(&proxy_url)
            .map_err(|_| FalconError::ProxyUnresolved { proxy: proxy_url })?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| FalconError::HttpRequestFailed {
        url: "<client>".to_string(),
        reason: e.to_string(),
    })
}

/// Fail on the body markers the API uses for authorization problems.
///
/// These are authoritative even when the HTTP status looks successful.
pub fn check_body(body: &str, scope: &str) -> Result<()> {
    let lowered = body.to_ascii_lowercase();
    if lowered.contains("authorization failed") {
        return Err(FalconError::AccessDenied {
            scope: scope.to_string(),
        });
    }
    if lowered.contains("invalid bearer token") {
        return Err(FalconError::InvalidBearerToken);
    }
    Ok(())
}

/// Authenticated client bound to one API base URL
pub struct ApiClient {
    http: Client,
    session: Session,
    proxy: Option<String>,
}

impl ApiClient {
    pub fn new(http: Client, session: Session, settings: &Settings) -> Self {
        Self {
            http,
            session,
            proxy: settings.proxy.url(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let raw = format!("{}{}", self.session.base_url, path);
        Url::parse_with_params(&raw, query).map_err(|e| FalconError::ApiRequestFailed {
            endpoint: raw.clone(),
            reason: e.to_string(),
        })
    }

    fn send(&self, url: Url) -> Result<Response> {
        tracing::debug!(%url, "GET");
        self.http
            .get(url)
            .bearer_auth(&self.session.token)
            .send()
            .map_err(|e| transport::translate(&e, self.proxy.as_deref()))
    }

    /// GET a JSON endpoint, applying the body checks for `scope`.
    pub fn get_json(&self, path: &str, query: &[(&str, &str)], scope: &str) -> Result<Value> {
        let url = self.url(path, query)?;
        let response = self.send(url)?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| transport::translate(&e, self.proxy.as_deref()))?;

        check_body(&body, scope)?;
        if !status.is_success() {
            return Err(FalconError::ApiRequestFailed {
                endpoint: path.to_string(),
                reason: format!("HTTP {status}: {}", truncate(&body, 200)),
            });
        }

        serde_json::from_str(&body).map_err(|e| FalconError::ResponseParseFailed {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// GET a binary endpoint, returning the response for streaming.
    pub fn get_stream(&self, path: &str, query: &[(&str, &str)], scope: &str) -> Result<Response> {
        let url = self.url(path, query)?;
        let response = self.send(url)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        check_body(&body, scope)?;
        Err(FalconError::ApiRequestFailed {
            endpoint: path.to_string(),
            reason: format!("HTTP {status}: {}", truncate(&body, 200)),
        })
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }
}

fn truncate(body: &str, max_chars: usize) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max_chars).collect();
    format!("{cut}...")
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared wiremock fixtures for API tests.
    //!
    //! The blocking client must not run inside an async context, so the mock
    //! server lives on its own runtime and tests drive it from plain threads.

    use tokio::runtime::Runtime;
    use wiremock::MockServer;

    use crate::cli::SensorArgs;
    use crate::config::Settings;

    pub struct MockApi {
        pub runtime: Runtime,
        pub server: MockServer,
    }

    impl MockApi {
        pub fn start() -> Self {
            let runtime = Runtime::new().expect("tokio runtime");
            let server = runtime.block_on(MockServer::start());
            Self { runtime, server }
        }

        pub fn mount(&self, mock: wiremock::Mock) {
            self.runtime.block_on(mock.mount(&self.server));
        }

        pub fn uri(&self) -> String {
            self.server.uri()
        }

        /// Paths of every request the server has seen, in arrival order.
        pub fn received_paths(&self) -> Vec<String> {
            self.runtime
                .block_on(self.server.received_requests())
                .unwrap_or_default()
                .into_iter()
                .map(|request| request.url.path().to_string())
                .collect()
        }

        /// Settings pointing every API call at the mock server.
        pub fn settings(&self, args: SensorArgs) -> Settings {
            let args = SensorArgs {
                api_base_url: Some(self.uri()),
                ..args
            };
            Settings::resolve(&args).expect("valid test settings")
        }
    }
}
