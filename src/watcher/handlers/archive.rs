//! Handler for exported site archives.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::watcher::{WatchAction, WatchError, WatchHandler};

/// Matches `*.zip` files directly inside the watched directory whose file
/// name contains a fragment (`edit-site-export` by default).
pub struct ArchiveFileHandler {
    dir: PathBuf,
    fragment: String,
}

impl ArchiveFileHandler {
    pub fn new(dir: impl Into<PathBuf>, fragment: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            fragment: fragment.into(),
        }
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    fn is_candidate(&self, path: &Path) -> bool {
        let is_zip = path.extension().is_some_and(|ext| ext == "zip");
        let name_matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains(self.fragment.as_str()));

        is_zip && name_matches
    }
}

#[async_trait]
impl WatchHandler for ArchiveFileHandler {
    fn name(&self) -> &str {
        "archive"
    }

    fn watch_dir(&self) -> &Path {
        &self.dir
    }

    fn matches(&self, path: &Path) -> bool {
        // Only the top level of the directory, like a `*.zip` glob
        path.parent() == Some(self.dir.as_path()) && self.is_candidate(path)
    }

    async fn existing(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await else {
            return found;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            if is_file && self.matches(&path) {
                found.push(path);
            }
        }

        found.sort();
        found
    }

    async fn on_arrival(&self, path: &Path) -> Result<WatchAction, WatchError> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => Ok(WatchAction::Process {
                archive: path.to_path_buf(),
            }),
            Ok(_) => Ok(WatchAction::None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(WatchAction::None),
            Err(e) => Err(WatchError::HandlerFailed {
                handler: self.name().to_string(),
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
}
