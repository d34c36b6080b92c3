//! Invocation of the external code generator over the staged mirror.

use std::fs;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::config::GeneratorConfig;

/// Recreate the output directory and run the generator with its configured
/// arguments plus the given file list. Fails on spawn error or non-zero exit.
pub fn run(config: &GeneratorConfig, files: &[String]) -> Result<()> {
    if config.output_dir.exists() {
        fs::remove_dir_all(&config.output_dir).with_context(|| {
            format!(
                "failed to remove generator output dir {}",
                config.output_dir.display()
            )
        })?;
    }
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "failed to create generator output dir {}",
            config.output_dir.display()
        )
    })?;

    info!(
        program = %config.program,
        args = ?config.args,
        files = files.len(),
        "Running code generator"
    );

    let status = Command::new(&config.program)
        .args(&config.args)
        .args(files)
        .status()
        .with_context(|| format!("failed to launch generator {}", config.program))?;

    if !status.success() {
        bail!("generator {} exited with {}", config.program, status);
    }

    info!(program = %config.program, "Code generator finished");
    Ok(())
}
