//! Default command: resolve settings and run the selected workflow

use crate::cli::SensorArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::operations;
use crate::ui;

/// Run the installer with the given sensor options
pub fn run(args: &SensorArgs) -> Result<()> {
    let settings = Settings::resolve(args)?;
    for warning in &settings.warnings {
        tracing::warn!("{warning}");
        ui::warn(warning);
    }
    tracing::debug!(mode = ?settings.mode, "Settings resolved");
    operations::run(&settings)
}
