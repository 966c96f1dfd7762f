//! Operator-facing messages
//!
//! Progress steps and outcomes go to stdout; warnings go to stderr so they
//! survive when stdout is captured (e.g. the token printed by
//! `--get-access-token`). Diagnostic detail belongs in `tracing`, not here.

use console::Style;

/// Announce a workflow step.
pub fn step(message: &str) {
    println!("{}", format_step(message));
}

/// Report a completed outcome.
pub fn success(message: &str) {
    println!("{}", Style::new().green().bold().apply_to(message));
}

/// Report a non-fatal problem.
pub fn warn(message: &str) {
    eprintln!("{}", format_warning(message));
}

fn format_step(message: &str) -> String {
    format!("{} {message}", Style::new().cyan().bold().apply_to("==>"))
}

fn format_warning(message: &str) -> String {
    format!("{} {message}", Style::new().yellow().bold().apply_to("WARNING:"))
}
