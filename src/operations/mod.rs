//! Installer workflows
//!
//! This module provides high-level operations that coordinate:
//! - InstallOperation: download, install, register and restart the sensor,
//!   and the download-only and install-only variants
//! - UninstallOperation: removal of the installed sensor
//! - Printing an API access token
//!
//! The operations coordinate with:
//! - Host identification (from platform module)
//! - Token acquisition, catalog and CID lookups (from api module)
//! - Package manager invocation (from installer module)
//! - Registration and service control (from sensor module)
//! - UI: status lines (from ui module)

pub mod install;
pub mod uninstall;

use crate::api::{self, ApiClient, auth};
use crate::config::{Mode, Settings};
use crate::error::{FalconError, Result};

pub use install::InstallOperation;
pub use uninstall::UninstallOperation;

/// Run the workflow selected by `settings.mode`.
pub fn run(settings: &Settings) -> Result<()> {
    if settings.mode.needs_root() && !is_root() {
        return Err(FalconError::NotRoot);
    }

    match settings.mode {
        Mode::Install | Mode::InstallOnly | Mode::DownloadOnly => {
            InstallOperation::new(settings).execute()
        }
        Mode::Uninstall => UninstallOperation::new().execute(),
        Mode::PrintToken => print_token(settings),
    }
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Authenticate and bind a client to the resulting session.
pub fn connect(settings: &Settings) -> Result<ApiClient> {
    let http = api::http_client(settings)?;
    let session = auth::authenticate(settings, &http)?;
    let client = ApiClient::new(http, session, settings);
    tracing::debug!(cloud = %client.session().cloud, "Authenticated");
    Ok(client)
}

/// Print a bearer token on stdout and nothing else.
fn print_token(settings: &Settings) -> Result<()> {
    let http = api::http_client(settings)?;
    let session = auth::authenticate(settings, &http)?;
    println!("{}", session.token);
    Ok(())
}
