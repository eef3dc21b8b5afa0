//! Handler trait and action types for the archive watcher.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::WatchError;

/// Actions returned by handlers for the watcher to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchAction {
    /// Queue an archive for extraction and sync.
    Process { archive: PathBuf },

    /// Nothing to do (e.g., the file vanished before it settled).
    None,
}

/// Trait for handlers that react to files arriving in a watched directory.
///
/// Handlers declare which directory they need watched and which paths they
/// care about, and return actions for the watcher to execute.
#[async_trait]
pub trait WatchHandler: Send + Sync {
    /// Handler name for logging.
    fn name(&self) -> &str;

    /// Directory that must be watched for this handler.
    fn watch_dir(&self) -> &Path;

    /// Check if this handler should process events for the given path.
    fn matches(&self, path: &Path) -> bool;

    /// Matching files already present, for the optional startup scan.
    async fn existing(&self) -> Vec<PathBuf>;

    /// Handle a settled arrival (called after debouncing).
    async fn on_arrival(&self, path: &Path) -> Result<WatchAction, WatchError>;
}
