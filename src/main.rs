//! falcon-linux-install - CrowdStrike Falcon sensor installer for Linux
//!
//! Identifies the host, fetches the matching sensor installer from the
//! Falcon API, installs it with the native package manager and registers
//! the sensor with the tenant's CID.

use std::io::IsTerminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod api;
mod cli;
mod commands;
mod config;
mod error;
mod installer;
mod operations;
mod platform;
mod progress;
mod sensor;
mod temp;
mod ui;

use cli::{Cli, Commands};
use error::EXIT_FAILURE;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "error" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("error"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(EXIT_FAILURE);
        }
    };

    init_tracing(cli.verbose);

    let result = match cli.command {
        None => commands::install::run(&cli.sensor),
        Some(Commands::Version) => commands::version::run(),
        Some(Commands::Completions(args)) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        if let Some(help) = miette::Diagnostic::help(&e) {
            eprintln!("  help: {help}");
        }
        std::process::exit(e.exit_code());
    }
}
