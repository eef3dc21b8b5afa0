//! Config command: show the effective settings.

use std::process::ExitCode;

use anyhow::Context;

use crate::config::Settings;

/// Print the settings after all layers and CLI overrides were applied.
pub fn run(settings: &Settings) -> anyhow::Result<ExitCode> {
    let rendered = settings
        .to_toml()
        .context("failed to render configuration")?;
    println!("{rendered}");
    Ok(ExitCode::SUCCESS)
}
