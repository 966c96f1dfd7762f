//! CLI definitions using clap derive API
//!
//! Every sensor option is both a long flag and a `FALCON_*` environment
//! variable, flags taking precedence. Values are kept as raw strings here and
//! validated by [`crate::config::Settings::resolve`].
//! - sensor: install/registration options
//! - completions: completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};

pub mod completions;
pub mod sensor;

pub use completions::CompletionsArgs;
pub use sensor::SensorArgs;

/// Falcon Linux installer
///
/// Download, install and register the CrowdStrike Falcon sensor.
#[derive(Parser, Debug)]
#[command(
    name = "falcon-linux-install",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Download, install and register the CrowdStrike Falcon sensor on Linux",
    long_about = "Queries the Falcon API for the sensor installer matching this host, installs it \
                  with the native package manager and registers it with your CID. Every option can \
                  also be given through its FALCON_* environment variable.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  FALCON_CLIENT_ID=.. FALCON_CLIENT_SECRET=.. falcon-linux-install\n   \
                  falcon-linux-install --cloud eu-1 --tags web,prod      \x1b[90m# Tag the host\x1b[0m\n   \
                  falcon-linux-install --download-only --download-path /srv/pkgs\n   \
                  falcon-linux-install --uninstall                        \x1b[90m# Remove the sensor\x1b[0m\n"
)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub sensor: SensorArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completions
    Completions(CompletionsArgs),

    /// Show version information
    #[command(hide = true)]
    Version,
}
