//! Archive watcher: event loop, work queue and lifecycle handle.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;

use crate::pipeline::{ArchiveState, Pipeline};

use super::debouncer::Debouncer;
use super::error::WatchError;
use super::event::{Change, classify};
use super::handler::{WatchAction, WatchHandler};
use super::notifications::{SyncBroadcaster, SyncEvent};

/// Watches directories for arriving archives and feeds them to a pipeline.
///
/// Built with [`ArchiveWatcher::builder`] and started with
/// [`ArchiveWatcherBuilder::spawn`], which hands back a [`WatcherHandle`].
pub struct ArchiveWatcher {
    /// Registered handlers.
    handlers: Vec<Box<dyn WatchHandler>>,
    /// Settles arrivals until their writer is done.
    debouncer: Debouncer,
    /// Channel for receiving file events.
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    /// The underlying file watcher. Dropped with the loop.
    _watcher: notify::RecommendedWatcher,
    /// Work queue to the single pipeline worker.
    queue: mpsc::Sender<PathBuf>,
    /// Queue matching files present at startup.
    process_existing: bool,
    shutdown: CancellationToken,
}

impl ArchiveWatcher {
    /// Create a builder for configuring the watcher.
    pub fn builder() -> ArchiveWatcherBuilder {
        ArchiveWatcherBuilder::new()
    }

    /// Main event loop.
    ///
    /// 1. Receives file events from notify
    /// 2. Debounces arrivals
    /// 3. Routes settled arrivals to matching handlers
    /// 4. Queues returned actions for the worker
    async fn run(mut self) -> Result<(), WatchError> {
        if self.process_existing {
            let mut existing = Vec::new();
            for handler in &self.handlers {
                existing.extend(handler.existing().await);
            }
            if !existing.is_empty() {
                crate::log_event!("watcher", "found existing", "{} archives", existing.len());
            }
            for path in existing {
                self.process_arrival(&path).await;
            }
        }

        crate::log_event!("watcher", "started");

        loop {
            // Periodic check for settled arrivals
            let timeout = sleep(Duration::from_millis(100));
            tokio::pin!(timeout);

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    crate::log_event!("watcher", "stopped");
                    break;
                }

                Some(res) = self.event_rx.recv() => {
                    match res {
                        Ok(event) => self.handle_event(event),
                        Err(e) => tracing::error!("[watcher] file watch error: {e}"),
                    }
                }

                _ = &mut timeout => {
                    for path in self.debouncer.take_ready() {
                        self.process_arrival(&path).await;
                    }
                }
            }
        }

        Ok(())
    }

    /// Fold an incoming event into the debouncer.
    fn handle_event(&mut self, event: Event) {
        for (path, change) in classify(&event) {
            match change {
                Change::Arrived => {
                    if self.handlers.iter().any(|h| h.matches(&path)) {
                        crate::debug_event!("watcher", "arrived", "{}", path.display());
                        self.debouncer.record(path);
                    } else {
                        crate::debug_event!(
                            "watcher",
                            "unmatched",
                            "{:?} {}",
                            event.kind,
                            path.display()
                        );
                    }
                }
                Change::Written => {
                    // Writes only matter for archives still settling
                    self.debouncer.touch(&path);
                }
                Change::Gone => {
                    if self.debouncer.remove(&path) {
                        crate::debug_event!("watcher", "vanished", "{}", path.display());
                    }
                }
            }
        }
    }

    /// Hand a settled arrival to the handlers and queue their actions.
    async fn process_arrival(&self, path: &Path) {
        for handler in &self.handlers {
            if !handler.matches(path) {
                continue;
            }

            match handler.on_arrival(path).await {
                Ok(action) => {
                    if let Err(e) = self.execute_action(action, handler.name()).await {
                        tracing::error!("[{}] action error: {e}", handler.name());
                    }
                }
                Err(e) => {
                    tracing::error!("[{}] handler error: {e}", handler.name());
                }
            }
        }
    }

    async fn execute_action(
        &self,
        action: WatchAction,
        handler_name: &str,
    ) -> Result<(), WatchError> {
        match action {
            WatchAction::Process { archive } => {
                crate::log_event!(handler_name, "queued", "{}", archive.display());
                self.queue
                    .send(archive)
                    .await
                    .map_err(|_| WatchError::ChannelClosed)?;
            }
            WatchAction::None => {
                crate::debug_event!(handler_name, "no action needed");
            }
        }
        Ok(())
    }
}

/// Processes queued archives strictly one after another.
async fn run_worker(
    pipeline: Arc<Pipeline>,
    mut queue: mpsc::Receiver<PathBuf>,
    broadcaster: SyncBroadcaster,
    shutdown: CancellationToken,
) {
    loop {
        let archive = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = queue.recv() => match next {
                Some(archive) => archive,
                None => break,
            },
        };

        // Queued twice before the first run consumed it
        if !archive.exists() {
            crate::debug_event!("worker", "skipped", "{} no longer exists", archive.display());
            continue;
        }

        crate::log_event!("worker", "processing", "{}", archive.display());

        let job = pipeline.clone();
        let path = archive.clone();
        let outcome = tokio::task::spawn_blocking(move || job.run(&path)).await;

        let event = match outcome {
            Ok(result) => {
                if let Ok(report) = &result {
                    crate::log_event!(
                        "worker",
                        "synced",
                        "{} files from {}",
                        report.files_copied,
                        archive.display()
                    );
                }
                SyncEvent::from_result(archive, &result)
            }
            Err(join_error) => {
                tracing::error!("[worker] pipeline task failed: {join_error}");
                SyncEvent::Failed {
                    archive,
                    stage: ArchiveState::Failed,
                    reason: join_error.to_string(),
                }
            }
        };

        broadcaster.send(event);
    }

    crate::debug_event!("worker", "stopped");
}

/// Owns the running watcher and its worker.
///
/// Dropping the handle leaves both tasks running; call
/// [`WatcherHandle::shutdown`] to stop them.
pub struct WatcherHandle {
    shutdown: CancellationToken,
    watcher_task: JoinHandle<Result<(), WatchError>>,
    worker_task: JoinHandle<()>,
    broadcaster: SyncBroadcaster,
    watched: Vec<PathBuf>,
}

impl WatcherHandle {
    /// Subscribe to per-archive outcomes.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SyncEvent> {
        self.broadcaster.subscribe()
    }

    /// Directories being watched.
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }

    /// Token that stops the watcher when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop watching and wait for the worker to finish its current archive.
    pub async fn shutdown(self) -> Result<(), WatchError> {
        self.shutdown.cancel();
        self.join().await
    }

    /// Wait until the watcher stops (after cancellation or a fatal error).
    pub async fn join(self) -> Result<(), WatchError> {
        let loop_result = self.watcher_task.await;
        // The worker has nothing left to do once the loop is gone
        self.shutdown.cancel();
        self.worker_task.await?;
        loop_result?
    }
}

/// Builder for constructing an [`ArchiveWatcher`].
pub struct ArchiveWatcherBuilder {
    handlers: Vec<Box<dyn WatchHandler>>,
    pipeline: Option<Arc<Pipeline>>,
    broadcaster: Option<SyncBroadcaster>,
    debounce_ms: u64,
    queue_capacity: usize,
    process_existing: bool,
    shutdown: Option<CancellationToken>,
}

impl ArchiveWatcherBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            pipeline: None,
            broadcaster: None,
            debounce_ms: 300,
            queue_capacity: 16,
            process_existing: false,
            shutdown: None,
        }
    }

    /// Add a handler.
    pub fn handler(mut self, handler: impl WatchHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Set the pipeline that processes queued archives.
    pub fn pipeline(mut self, pipeline: Arc<Pipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Set the outcome broadcaster.
    pub fn broadcaster(mut self, broadcaster: SyncBroadcaster) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Set the debounce duration in milliseconds.
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Set how many settled archives may wait for the worker.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Also process matching files already present at startup.
    pub fn process_existing(mut self, enabled: bool) -> Self {
        self.process_existing = enabled;
        self
    }

    /// Use an externally owned cancellation token.
    pub fn shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    /// Start the watcher and its worker on the current tokio runtime.
    pub fn spawn(self) -> Result<WatcherHandle, WatchError> {
        let pipeline = self.pipeline.ok_or_else(|| WatchError::InitFailed {
            reason: "Pipeline is required".to_string(),
        })?;

        if self.handlers.is_empty() {
            return Err(WatchError::InitFailed {
                reason: "At least one handler is required".to_string(),
            });
        }

        let broadcaster = self.broadcaster.unwrap_or_default();
        let shutdown = self.shutdown.unwrap_or_default();

        // Create channel for events
        let (event_tx, event_rx) = mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = event_tx.blocking_send(res);
        })?;

        let mut watched = Vec::new();
        let mut seen = HashSet::new();
        for handler in &self.handlers {
            let dir = handler.watch_dir().to_path_buf();
            if !seen.insert(dir.clone()) {
                continue;
            }
            watcher
                .watch(&dir, RecursiveMode::NonRecursive)
                .map_err(|e| WatchError::PathWatchFailed {
                    path: dir.clone(),
                    reason: e.to_string(),
                })?;
            crate::debug_event!("watcher", "watching", "{}", dir.display());
            watched.push(dir);
        }

        let (queue_tx, queue_rx) = mpsc::channel(self.queue_capacity);

        let worker_task = tokio::spawn(run_worker(
            pipeline,
            queue_rx,
            broadcaster.clone(),
            shutdown.clone(),
        ));

        let archive_watcher = ArchiveWatcher {
            handlers: self.handlers,
            debouncer: Debouncer::new(self.debounce_ms),
            event_rx,
            _watcher: watcher,
            queue: queue_tx,
            process_existing: self.process_existing,
            shutdown: shutdown.clone(),
        };
        let watcher_task = tokio::spawn(archive_watcher.run());

        Ok(WatcherHandle {
            shutdown,
            watcher_task,
            worker_task,
            broadcaster,
            watched,
        })
    }
}

impl Default for ArchiveWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
