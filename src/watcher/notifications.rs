//! Broadcast of per-archive outcomes.
//!
//! The CLI subscribes to print banners; tests subscribe to wait for a sync
//! without polling the filesystem.

use std::path::PathBuf;

use tokio::sync::broadcast;

use crate::pipeline::{ArchiveState, PipelineError, error_chain};
use crate::sync::SyncReport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Synced {
        archive: PathBuf,
        files_copied: usize,
        cleanup_failures: usize,
    },
    Failed {
        archive: PathBuf,
        stage: ArchiveState,
        reason: String,
    },
}

impl SyncEvent {
    /// Summarize a pipeline run.
    pub fn from_result(archive: PathBuf, result: &Result<SyncReport, PipelineError>) -> Self {
        match result {
            Ok(report) => SyncEvent::Synced {
                archive,
                files_copied: report.files_copied,
                cleanup_failures: report.cleanup_failures.len(),
            },
            Err(e) => SyncEvent::Failed {
                archive,
                stage: e.stage(),
                reason: error_chain(e),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SyncEvent::Synced { .. })
    }

    pub fn archive(&self) -> &PathBuf {
        match self {
            SyncEvent::Synced { archive, .. } | SyncEvent::Failed { archive, .. } => archive,
        }
    }
}

/// Fans sync outcomes out to any number of subscribers.
#[derive(Clone)]
pub struct SyncBroadcaster {
    sender: broadcast::Sender<SyncEvent>,
}

impl SyncBroadcaster {
    /// Create a new broadcaster with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn send(&self, event: SyncEvent) {
        match self.sender.send(event.clone()) {
            Ok(count) => {
                crate::debug_event!("broadcast", "sent", "{event:?} to {count} subscribers");
            }
            Err(_) => {
                // No receivers, this is fine
                crate::debug_event!("broadcast", "dropped", "no subscribers for {event:?}");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }
}

impl Default for SyncBroadcaster {
    fn default() -> Self {
        Self::new(64)
    }
}
