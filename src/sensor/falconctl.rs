//! Sensor registration through `falconctl`

use std::path::Path;

use crate::config::Settings;
use crate::error::{FalconError, Result};
use crate::installer::Invocation;

/// Arguments registering the sensor with `cid` and the configured options.
///
/// The CID is always set; every other option is passed only when configured.
pub fn registration_args(settings: &Settings, cid: &str) -> Vec<String> {
    let mut args = vec!["-s".to_string(), "-f".to_string(), format!("--cid={cid}")];

    if let Some(token) = &settings.provisioning_token {
        args.push(format!("--provisioning-token={token}"));
    }
    if let Some(tags) = &settings.tags {
        args.push(format!("--tags={tags}"));
    }
    if let Some(disabled) = settings.proxy.disabled {
        args.push(format!("--apd={disabled}"));
    }
    if let Some(host) = &settings.proxy.host {
        args.push(format!("--aph={host}"));
    }
    if let Some(port) = settings.proxy.port {
        args.push(format!("--app={port}"));
    }
    if let Some(billing) = settings.billing {
        args.push(format!("--billing={billing}"));
    }
    if let Some(backend) = settings.backend {
        args.push(format!("--backend={backend}"));
    }
    if let Some(trace) = settings.trace {
        args.push(format!("--trace={trace}"));
    }
    args
}

/// Register the sensor through the `falconctl` binary at `falconctl`.
pub fn register_with(falconctl: &Path, settings: &Settings, cid: &str) -> Result<()> {
    let invocation = Invocation::new(
        &falconctl.display().to_string(),
        registration_args(settings, cid),
    );
    invocation
        .run()
        .map_err(|reason| FalconError::RegistrationFailed { reason })?;
    tracing::info!("Sensor registered");
    Ok(())
}
