//! CLI module: argument parsing, settings resolution and command dispatch.

pub mod args;
pub mod commands;

use anyhow::{Context, bail};

use crate::config::Settings;

pub use args::Cli;

/// Load settings for the invocation and apply CLI overrides on top.
pub fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    if let Some(path) = cli.config.as_deref().filter(|p| !p.is_file()) {
        bail!("config file {} does not exist", path.display());
    }

    let dir = cli.watch_dir();
    let mut settings = Settings::load(&dir, cli.config.as_deref())
        .with_context(|| format!("failed to load settings for {}", dir.display()))?;

    // An empty fragment falls back to whatever the config says
    if let Some(fragment) = cli.fragment.as_ref().filter(|f| !f.is_empty()) {
        settings.watch.fragment = fragment.clone();
    }
    if let Some(dir) = &cli.dir {
        settings.watch.dir = dir.clone();
    }
    if let Some(ms) = cli.debounce_ms {
        settings.watch.debounce_ms = ms;
    }
    if cli.process_existing {
        settings.watch.process_existing = true;
    }

    settings.validate()?;
    Ok(settings)
}
