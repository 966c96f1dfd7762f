//! External command invocation

use std::fmt;
use std::process::Command;

/// A program with its arguments and extra environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Run to completion, returning stdout or a failure reason.
    ///
    /// Output is captured; stderr (or stdout when stderr is empty) becomes
    /// the reason.
    pub fn run(&self) -> std::result::Result<String, String> {
        tracing::debug!(command = %self, "Running");
        let output = Command::new(&self.program)
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()
            .map_err(|e| format!("{} could not be started: {e}", self.program))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let detail = if stderr.is_empty() { stdout } else { stderr };
        let status = output
            .status
            .code()
            .map_or_else(|| "killed by signal".to_string(), |code| format!("exit code {code}"));
        Err(if detail.is_empty() {
            format!("{} failed ({status})", self.program)
        } else {
            format!("{} failed ({status}): {detail}", self.program)
        })
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value} ")?;
        }
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Run `primary`, then `fallback` if it fails.
///
/// Returns both failure reasons when both fail.
pub fn run_with_fallback(
    primary: &Invocation,
    fallback: &Invocation,
) -> std::result::Result<(), String> {
    let first = match primary.run() {
        Ok(_) => return Ok(()),
        Err(reason) => reason,
    };
    tracing::warn!(command = %primary, reason = %first, "Retrying with {}", fallback.program);
    fallback
        .run()
        .map(|_| ())
        .map_err(|second| format!("{first}; {second}"))
}

/// Whether `program` resolves to an executable on the process `PATH`.
pub fn is_available(program: &str) -> bool {
    which::which(program).is_ok()
}
