//! External process execution
//!
//! `gcloud` and `kubectl` are treated as opaque executables: this tool builds
//! their argument lists, runs them in strict sequence and fails fatally on
//! the first non-zero exit. Their output is never interpreted and nothing is
//! retried. Child stdio is inherited so job output streams straight through.

use anyhow::{Context, Result};
use std::process::Command;
use tracing::debug;

/// Runs an external command to completion, failing on non-zero exit
pub fn run_command(program: &str, args: &[String]) -> Result<()> {
    debug!("Executing {} {:?}", program, args);

    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to execute '{program}'. Is it installed?"))?;

    if !status.success() {
        anyhow::bail!(
            "Command '{}' failed with exit code {}",
            program,
            status.code().unwrap_or(-1)
        );
    }

    Ok(())
}
