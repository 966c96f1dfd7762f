//! AWS Systems Manager Parameter Store as a credential source
//!
//! On EC2 the API client id and secret may be stored as the SSM parameters
//! `FALCON_CLIENT_ID` and `FALCON_CLIENT_SECRET`. The instance role's
//! temporary credentials come from IMDSv2, and the `GetParameters` call is
//! signed with AWS Signature Version 4.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{FalconError, Result};

/// Instance metadata service endpoint.
pub const IMDS_ENDPOINT: &str = "http://169.254.169.254";

/// Parameter holding the API client id.
pub const CLIENT_ID_PARAMETER: &str = "FALCON_CLIENT_ID";

/// Parameter holding the API client secret.
pub const CLIENT_SECRET_PARAMETER: &str = "FALCON_CLIENT_SECRET";

const IMDS_TOKEN_TTL_SECONDS: &str = "300";
const IMDS_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const SSM_TARGET: &str = "AmazonSSM.GetParameters";
const SSM_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

fn unavailable(reason: impl Into<String>) -> FalconError {
    FalconError::ParameterStoreUnavailable {
        reason: reason.into(),
    }
}

/// Temporary credentials of the instance role
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoleCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetParametersResponse {
    #[serde(default)]
    parameters: Vec<Parameter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Parameter {
    name: String,
    value: String,
}

/// Client id and secret from Parameter Store, using the real AWS endpoints.
pub fn parameter_store_credentials() -> Result<(String, String)> {
    let http = Client::builder()
        .connect_timeout(IMDS_CONNECT_TIMEOUT)
        .build()
        .map_err(|e| unavailable(e.to_string()))?;
    let metadata = InstanceMetadata::fetch(&http, IMDS_ENDPOINT)?;
    let endpoint = format!("https://ssm.{}.amazonaws.com", metadata.region);
    get_client_credentials(&http, &endpoint, &metadata, Utc::now())
}

/// What the installer needs from the instance metadata service
#[derive(Debug, Clone)]
pub struct InstanceMetadata {
    pub region: String,
    pub credentials: RoleCredentials,
}

impl InstanceMetadata {
    /// Query IMDSv2 for region and role credentials.
    pub fn fetch(http: &Client, base: &str) -> Result<Self> {
        let token = http
            .put(format!("{base}/latest/api/token"))
            .header("X-aws-ec2-metadata-token-ttl-seconds", IMDS_TOKEN_TTL_SECONDS)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::text)
            .map_err(|e| unavailable(format!("not running on EC2 ({e})")))?;

        let get = |path: &str| -> Result<String> {
            http.get(format!("{base}{path}"))
                .header("X-aws-ec2-metadata-token", &token)
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .and_then(reqwest::blocking::Response::text)
                .map(|body| body.trim().to_string())
                .map_err(|e| unavailable(format!("metadata {path}: {e}")))
        };

        let region = get("/latest/meta-data/placement/region")?;
        let role = get("/latest/meta-data/iam/security-credentials/")?
            .lines()
            .next()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| unavailable("no instance role attached"))?;
        let credentials: RoleCredentials = serde_json::from_str(&get(&format!(
            "/latest/meta-data/iam/security-credentials/{role}"
        ))?)
        .map_err(|e| unavailable(format!("role credentials: {e}")))?;

        tracing::debug!(%region, %role, "Instance metadata retrieved");
        Ok(Self {
            region,
            credentials,
        })
    }
}

/// Call SSM `GetParameters` for the client id and secret.
pub fn get_client_credentials(
    http: &Client,
    endpoint: &str,
    metadata: &InstanceMetadata,
    now: DateTime<Utc>,
) -> Result<(String, String)> {
    let body = serde_json::json!({
        "Names": [CLIENT_ID_PARAMETER, CLIENT_SECRET_PARAMETER],
        "WithDecryption": true,
    })
    .to_string();

    let host = endpoint
        .split_once("://")
        .map_or(endpoint, |(_, rest)| rest)
        .trim_end_matches('/');
    let request = SignedRequest::new(host, &metadata.region, &metadata.credentials, &body, now);

    let mut builder = http
        .post(format!("{}/", endpoint.trim_end_matches('/')))
        .header("Content-Type", SSM_CONTENT_TYPE)
        .header("X-Amz-Target", SSM_TARGET)
        .header("X-Amz-Date", &request.amz_date)
        .header("Authorization", &request.authorization);
    if let Some(token) = &metadata.credentials.token {
        builder = builder.header("X-Amz-Security-Token", token);
    }

    let response = builder
        .body(body)
        .send()
        .map_err(|e| unavailable(format!("SSM request failed: {e}")))?;
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| unavailable(format!("SSM response: {e}")))?;
    if !status.is_success() {
        return Err(unavailable(format!("SSM returned HTTP {status}")));
    }

    let parsed: GetParametersResponse =
        serde_json::from_str(&text).map_err(|e| unavailable(format!("SSM response: {e}")))?;
    let value = |name: &str| {
        parsed
            .parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.clone())
            .ok_or_else(|| unavailable(format!("parameter {name} not found")))
    };
    Ok((value(CLIENT_ID_PARAMETER)?, value(CLIENT_SECRET_PARAMETER)?))
}

/// Headers produced by SigV4 signing of an SSM request
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub amz_date: String,
    pub authorization: String,
}

impl SignedRequest {
    pub fn new(
        host: &str,
        region: &str,
        credentials: &RoleCredentials,
        body: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let mut headers = vec![
            ("content-type", SSM_CONTENT_TYPE.to_string()),
            ("host", host.to_string()),
            ("x-amz-date", amz_date.clone()),
        ];
        if let Some(token) = &credentials.token {
            headers.push(("x-amz-security-token", token.clone()));
        }
        headers.push(("x-amz-target", SSM_TARGET.to_string()));

        let canonical = Canonical {
            method: "POST",
            path: "/",
            query: "",
            headers: &headers,
            payload: body.as_bytes(),
        };
        let authorization = canonical.authorization(
            &credentials.access_key_id,
            &credentials.secret_access_key,
            &amz_date,
            region,
            "ssm",
        );

        Self {
            amz_date,
            authorization,
        }
    }
}

/// The parts of an HTTP request covered by a SigV4 signature
///
/// `headers` must be lowercase and sorted by name; `query` must already be
/// in canonical form.
#[derive(Debug, Clone, Copy)]
pub struct Canonical<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    pub headers: &'a [(&'a str, String)],
    pub payload: &'a [u8],
}

impl Canonical<'_> {
    pub fn signed_headers(&self) -> String {
        self.headers
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// The canonical request string that gets hashed into the string to sign.
    pub fn request(&self) -> String {
        let canonical_headers = self
            .headers
            .iter()
            .fold(String::new(), |mut acc, (name, value)| {
                let _ = writeln!(acc, "{name}:{}", value.trim());
                acc
            });
        format!(
            "{}\n{}\n{}\n{canonical_headers}\n{}\n{}",
            self.method,
            self.path,
            self.query,
            self.signed_headers(),
            hex(&Sha256::digest(self.payload))
        )
    }

    /// `Authorization` header value for this request.
    pub fn authorization(
        &self,
        access_key_id: &str,
        secret: &str,
        amz_date: &str,
        region: &str,
        service: &str,
    ) -> String {
        let date = amz_date.get(..8).unwrap_or(amz_date);
        let scope = format!("{date}/{region}/{service}/aws4_request");
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
            hex(&Sha256::digest(self.request().as_bytes()))
        );
        let key = signing_key(secret, date, region, service);
        let signature = hex(&hmac_sha256(&key, string_to_sign.as_bytes()));
        format!(
            "AWS4-HMAC-SHA256 Credential={access_key_id}/{scope}, SignedHeaders={}, Signature={signature}",
            self.signed_headers()
        )
    }
}

/// Derive the SigV4 signing key for a date, region and service.
pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> [u8; 32] {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// HMAC-SHA256 (RFC 2104).
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    const BLOCK_SIZE: usize = 64;

    let mut block = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        block[..32].copy_from_slice(&Sha256::digest(key));
    } else {
        block[..key.len()].copy_from_slice(key);
    }

    let mut inner = Sha256::new();
    inner.update(block.map(|b| b ^ 0x36));
    inner.update(data);

    let mut outer = Sha256::new();
    outer.update(block.map(|b| b ^ 0x5c));
    outer.update(inner.finalize());
    outer.finalize().into()
}

/// Lowercase hex encoding.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
