//! Credential broker
//!
//! Produces a [`Session`]: a bearer token plus the cloud it is valid for.
//! A pre-issued token is used as-is; a client id/secret pair (possibly read
//! from AWS Parameter Store) is exchanged at the OAuth token endpoint, whose
//! `X-Cs-Region` header tells which cloud the tenant lives in.

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::{Cloud, Credentials, Settings};
use crate::error::{FalconError, Result, transport};
use crate::ui;

use super::aws;

/// Token endpoint path.
pub const TOKEN_PATH: &str = "/oauth2/token";

/// Response header carrying the tenant's region.
pub const REGION_HEADER: &str = "x-cs-region";

/// Bearer token and the API it is valid for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub cloud: Cloud,
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

fn base_url(settings: &Settings, cloud: Cloud) -> String {
    settings
        .api_base_url
        .clone()
        .unwrap_or_else(|| cloud.base_url())
}

/// Obtain a session for the configured credentials.
pub fn authenticate(settings: &Settings, http: &Client) -> Result<Session> {
    match &settings.credentials {
        Credentials::AccessToken(token) => {
            let cloud = settings.cloud.ok_or(FalconError::CloudRequired)?;
            tracing::debug!(%cloud, "Using supplied access token");
            Ok(Session {
                token: token.clone(),
                cloud,
                base_url: base_url(settings, cloud),
            })
        }
        Credentials::Client {
            client_id,
            client_secret,
        } => exchange(settings, http, client_id, client_secret),
        Credentials::ParameterStore => {
            let (client_id, client_secret) = aws::parameter_store_credentials().map_err(|e| {
                tracing::debug!(error = %e, "Parameter Store lookup failed");
                FalconError::MissingCredentials
            })?;
            ui::step("Using API credentials from AWS Parameter Store");
            exchange(settings, http, &client_id, &client_secret)
        }
    }
}

/// Exchange a client id/secret for a bearer token.
pub fn exchange(
    settings: &Settings,
    http: &Client,
    client_id: &str,
    client_secret: &str,
) -> Result<Session> {
    let initial_cloud = settings.cloud.unwrap_or(Cloud::Us1);
    let token_url = format!("{}{TOKEN_PATH}", base_url(settings, initial_cloud));
    let form = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", client_id)
        .append_pair("client_secret", client_secret)
        .finish();

    tracing::debug!(url = %token_url, "Requesting OAuth token");
    let proxy = settings.proxy.url();
    let response = http
        .post(&token_url)
        .header(
            reqwest::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(form)
        .send()
        .map_err(|e| transport::translate(&e, proxy.as_deref()))?;

    let status = response.status();
    let region = response
        .headers()
        .get(REGION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    let body = response
        .text()
        .map_err(|e| transport::translate(&e, proxy.as_deref()))?;

    let token = serde_json::from_str::<TokenResponse>(&body)
        .ok()
        .and_then(|r| r.access_token)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| FalconError::TokenRequestFailed {
            reason: format!("HTTP {status}"),
        })?;

    let (cloud, warning) = reconcile_region(settings.cloud, region.as_deref())?;
    if let Some(warning) = warning {
        tracing::warn!("{warning}");
        ui::warn(&warning);
    }

    Ok(Session {
        token,
        cloud,
        base_url: base_url(settings, cloud),
    })
}

/// Decide which cloud to use from configuration and the token response.
///
/// The region reported by the API wins. A configured cloud that disagrees
/// produces a warning, not an error.
pub fn reconcile_region(
    configured: Option<Cloud>,
    reported: Option<&str>,
) -> Result<(Cloud, Option<String>)> {
    let Some(reported) = reported.filter(|r| !r.trim().is_empty()) else {
        return Ok((configured.unwrap_or(Cloud::Us1), None));
    };

    let discovered = Cloud::from_region_header(reported)?;
    match configured {
        Some(configured) if configured != discovered => Ok((
            discovered,
            Some(format!(
                "FALCON_CLOUD '{configured}' does not match the API region '{discovered}'; \
                 continuing with '{discovered}'"
            )),
        )),
        _ => Ok((discovered, None)),
    }
}
