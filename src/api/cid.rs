//! Customer ID lookup

use serde_json::Value;

use crate::error::{FalconError, Result};

use super::{ApiClient, SCOPE_SENSOR_DOWNLOAD};

pub const CCID_PATH: &str = "/sensors/queries/installers/ccid/v1";

/// Return the configured CID, or ask the API for the tenant's CID.
pub fn resolve(api: &ApiClient, configured: Option<&str>) -> Result<String> {
    if let Some(cid) = configured {
        tracing::debug!("Using configured CID");
        return Ok(cid.to_string());
    }

    let response = api.get_json(CCID_PATH, &[], SCOPE_SENSOR_DOWNLOAD)?;
    let cid = first_resource(&response).ok_or(FalconError::CidNotFound)?;
    tracing::info!(%cid, "CID retrieved from API");
    Ok(cid)
}

fn first_resource(response: &Value) -> Option<String> {
    response
        .get("resources")?
        .get(0)?
        .as_str()
        .map(str::trim)
        .filter(|cid| !cid.is_empty())
        .map(ToString::to_string)
}
