//! One-shot mode: run the pipeline for a single archive.
//!
//! Useful for retrying an archive that failed while watching, since the
//! watcher only reacts to new arrivals.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;

use crate::config::Settings;
use crate::display;
use crate::pipeline::Pipeline;
use crate::watcher::SyncEvent;

use super::destination_names;

pub async fn run(settings: &Settings, archive: &Path) -> anyhow::Result<ExitCode> {
    let archive = std::path::absolute(archive)
        .with_context(|| format!("cannot resolve {}", archive.display()))?;
    let pipeline = Pipeline::new(settings.to_pipeline_config());

    crate::log_event!("once", "processing", "{}", archive.display());

    let path = archive.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.run(&path))
        .await
        .context("pipeline task panicked")?;

    let event = SyncEvent::from_result(archive, &result);
    display::print_outcome(&event, &destination_names(settings));

    Ok(if event.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
