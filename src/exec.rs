// db-tools/src/exec.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{error, info};
use which::which;

/// Locates an external tool in PATH.
pub fn locate_tool(name: &str) -> Result<PathBuf> {
    which(name).with_context(|| {
        format!(
            "{} executable not found in PATH. Please ensure PostgreSQL client tools are installed and in your PATH.",
            name
        )
    })
}

/// Runs an external command with `extra_env` merged over the inherited
/// process environment, waits for it to finish and captures its output.
///
/// Arguments are passed as a vector, never re-parsed by a shell, so values
/// containing spaces or quotes cannot corrupt argument boundaries. Captured
/// stdout is logged at info level and returned; stderr is logged at error
/// level. A non-zero exit status is an error.
pub fn run_tool(program: &Path, args: &[String], extra_env: &[(&str, &str)]) -> Result<String> {
    let tool = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());

    let output = Command::new(program)
        .args(args)
        .envs(extra_env.iter().copied())
        .output()
        .with_context(|| format!("Failed to execute {}", tool))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !stdout.trim().is_empty() {
        info!("{} stdout: {}", tool, stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        error!("{} stderr: {}", tool, stderr.trim_end());
    }

    if !output.status.success() {
        anyhow::bail!("{} exited with status {}", tool, output.status);
    }

    Ok(stdout)
}
