//! Watch mode: run until Ctrl-C, syncing every matching archive that lands.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;

use crate::config::Settings;
use crate::display;
use crate::pipeline::Pipeline;
use crate::watcher::handlers::ArchiveFileHandler;
use crate::watcher::{ArchiveWatcher, SyncBroadcaster};

use super::destination_names;

pub async fn run(settings: &Settings) -> anyhow::Result<ExitCode> {
    let pipeline_config = settings.to_pipeline_config();
    let root = pipeline_config.root.clone();
    let fragment = settings.watch.fragment.clone();

    let broadcaster = SyncBroadcaster::default();
    let mut outcomes = broadcaster.subscribe();

    let handle = ArchiveWatcher::builder()
        .handler(ArchiveFileHandler::new(&root, fragment.as_str()))
        .pipeline(Arc::new(Pipeline::new(pipeline_config)))
        .broadcaster(broadcaster)
        .debounce_ms(settings.watch.debounce_ms)
        .queue_capacity(settings.watch.queue_capacity)
        .process_existing(settings.watch.process_existing)
        .spawn()
        .with_context(|| format!("failed to watch {}", root.display()))?;

    display::print_watching(&root, &fragment);

    let names = destination_names(settings);
    let printer = tokio::spawn(async move {
        loop {
            match outcomes.recv().await {
                Ok(event) => display::print_outcome(&event, &names),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("[watch] {n} outcome banners were dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    crate::log_event!("watch", "shutting down");

    handle.shutdown().await.context("watcher did not stop cleanly")?;
    // Every sender is gone now, so the printer drains and exits
    let _ = printer.await;

    Ok(ExitCode::SUCCESS)
}
