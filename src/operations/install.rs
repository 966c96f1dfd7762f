//! Install operation module
//!
//! Drives the install workflow end to end: identify the host, resolve the
//! CID, pick an installer from the catalog, download and install it, then
//! register the sensor and restart its service. Each step fails fast, and
//! every remote lookup happens before the package manager touches the host.

use std::fs;
use std::path::PathBuf;

use crate::api::{ApiClient, catalog, cid};
use crate::config::{Mode, Settings};
use crate::error::{FalconError, Result};
use crate::installer::{self, PackageManager, signing};
use crate::platform::{self, HostOs};
use crate::sensor::{self, falconctl, service};
use crate::temp;
use crate::ui;

/// High-level install operation
///
/// Covers [`Mode::Install`], [`Mode::InstallOnly`] and [`Mode::DownloadOnly`].
/// The host, package manager and `falconctl` location are detected unless
/// set with the `with_*` builders.
pub struct InstallOperation<'a> {
    settings: &'a Settings,
    host: Option<HostOs>,
    package_manager: Option<PackageManager>,
    falconctl: PathBuf,
}

impl<'a> InstallOperation<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            host: None,
            package_manager: None,
            falconctl: PathBuf::from(sensor::FALCONCTL_PATH),
        }
    }

    pub fn with_host(mut self, host: HostOs) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_package_manager(mut self, pm: PackageManager) -> Self {
        self.package_manager = Some(pm);
        self
    }

    pub fn with_falconctl(mut self, path: impl Into<PathBuf>) -> Self {
        self.falconctl = path.into();
        self
    }

    pub fn execute(&self) -> Result<()> {
        let host = match &self.host {
            Some(host) => host.clone(),
            None => platform::detect()?,
        };
        ui::step(&format!("Detected {host}"));

        if self.settings.mode == Mode::DownloadOnly {
            let api = super::connect(self.settings)?;
            let path = self.download_only(&api, &host)?;
            ui::success(&format!("Falcon sensor downloaded to {}", path.display()));
            return Ok(());
        }

        let installed = sensor::is_installed_at(&self.falconctl);
        let pm = if installed {
            ui::warn("Falcon sensor is already installed, skipping package installation");
            None
        } else {
            let pm = match self.package_manager {
                Some(pm) => pm,
                None => PackageManager::detect(&host)?,
            };
            tracing::debug!(%pm, "Package manager selected");
            Some(pm)
        };

        // Connected lazily: an installed sensor with a configured CID needs no API.
        let mut api: Option<ApiClient> = None;

        let cid = match (self.settings.mode, &self.settings.cid) {
            (Mode::InstallOnly, _) => None,
            (_, Some(cid)) => Some(cid.clone()),
            (_, None) => Some(cid::resolve(self.client(&mut api)?, None)?),
        };

        if let Some(pm) = pm {
            let client = self.client(&mut api)?;
            self.install(client, &host, pm)?;
        }

        let Some(cid) = cid else {
            ui::success("Falcon sensor installed");
            return Ok(());
        };

        ui::step("Registering Falcon sensor");
        falconctl::register_with(&self.falconctl, self.settings, &cid)?;

        ui::step("Restarting Falcon sensor");
        service::restart(service::ServiceManager::detect())?;

        if service::is_running() {
            ui::success("Falcon sensor installed and running");
        } else {
            ui::warn("Falcon sensor was restarted but no sensor process is visible yet");
        }
        Ok(())
    }

    fn client<'c>(&self, slot: &'c mut Option<ApiClient>) -> Result<&'c ApiClient> {
        let client = match slot.take() {
            Some(client) => client,
            None => super::connect(self.settings)?,
        };
        Ok(slot.insert(client))
    }

    fn choose_installer(&self, api: &ApiClient, host: &HostOs) -> Result<catalog::Installer> {
        let pinned = self
            .settings
            .update_policy
            .as_deref()
            .map(|policy| catalog::pinned_version(api, policy, host.arch))
            .transpose()?;
        let (filter, installers) = catalog::list_installers(api, host, pinned.as_deref())?;
        let chosen = catalog::select(installers, self.settings.version_decrement, &filter)?;
        ui::step(&format!("Selected installer {} ({})", chosen.name, chosen.version));
        Ok(chosen)
    }

    fn download_only(&self, api: &ApiClient, host: &HostOs) -> Result<PathBuf> {
        let chosen = self.choose_installer(api, host)?;
        let dir = &self.settings.download_path;
        fs::create_dir_all(dir).map_err(|e| FalconError::IoError {
            message: format!("Failed to create {}: {e}", dir.display()),
        })?;
        catalog::download(api, &chosen, dir)
    }

    fn install(&self, api: &ApiClient, host: &HostOs, pm: PackageManager) -> Result<()> {
        let chosen = self.choose_installer(api, host)?;

        let scratch = temp::scratch_dir()?;
        ui::step("Downloading Falcon sensor");
        let package = catalog::download(api, &chosen, scratch.path())?;

        self.import_signing_key(host)?;

        ui::step(&format!("Installing Falcon sensor with {pm}"));
        installer::install_package(pm, &package)
    }

    /// Import the configured signing key on RPM hosts, warning when none is set.
    fn import_signing_key(&self, host: &HostOs) -> Result<()> {
        if !host.label.is_rpm() {
            return Ok(());
        }
        match &self.settings.gpg_key {
            Some(key) => signing::import_key(key),
            None => {
                tracing::warn!("No signing key configured");
                ui::warn("FALCON_GPG_KEY is not set; the package signature key was not imported");
                Ok(())
            }
        }
    }
}
