//! The destructive half of the pipeline: delete, copy, clean up.

use std::io;
use std::path::{Path, PathBuf};

use crate::paths::{Removal, copy_dir_all, delete_path, path_exists};
use crate::pipeline::PipelineConfig;

use super::SyncError;

/// A best-effort step that failed without aborting the sync.
#[derive(Debug)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub error: io::Error,
}

/// What a successful sync did.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Destination directories that existed and were deleted.
    pub removed: Vec<PathBuf>,
    /// Number of files copied out of the extracted theme.
    pub files_copied: usize,
    /// Deletions that failed and were skipped.
    pub cleanup_failures: Vec<CleanupFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.cleanup_failures.is_empty()
    }
}

/// Moves an extracted export into the theme root.
///
/// Step order matters and mirrors how the export is consumed:
/// 1. delete every configured destination (non-fatal)
/// 2. copy the extracted theme directory over the root (fatal on failure)
/// 3. delete the temporary directory (non-fatal)
/// 4. delete the consumed archive (non-fatal)
///
/// Because destinations go first, an export without a theme directory
/// leaves them deleted and not repopulated.
pub struct Synchronizer<'a> {
    config: &'a PipelineConfig,
}

impl<'a> Synchronizer<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the sync for an archive already extracted into the temp directory.
    pub fn sync(&self, archive: &Path) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        for destination in &self.config.destinations {
            if !path_exists(destination) {
                continue;
            }
            if let Some(Removal::Deleted) = self.best_effort_delete(destination, &mut report) {
                report.removed.push(destination.clone());
            }
        }

        let theme = self.config.theme_source();
        if !theme.is_dir() {
            return Err(SyncError::MissingTheme {
                path: self.config.temp_dir.clone(),
                expected: self.config.theme_dir.clone(),
            });
        }

        report.files_copied =
            copy_dir_all(&theme, &self.config.root).map_err(|source| SyncError::Copy {
                from: theme.clone(),
                to: self.config.root.clone(),
                source,
            })?;
        crate::debug_event!(
            "sync",
            "copied",
            "{} files from {}",
            report.files_copied,
            theme.display()
        );

        self.best_effort_delete(&self.config.temp_dir, &mut report);
        self.best_effort_delete(archive, &mut report);

        Ok(report)
    }

    fn best_effort_delete(&self, path: &Path, report: &mut SyncReport) -> Option<Removal> {
        match delete_path(path) {
            Ok(removal) => {
                crate::debug_event!("sync", "delete", "{} ({removal:?})", path.display());
                Some(removal)
            }
            Err(error) => {
                tracing::warn!("[sync] failed to delete {}: {error}", path.display());
                report.cleanup_failures.push(CleanupFailure {
                    path: path.to_path_buf(),
                    error,
                });
                None
            }
        }
    }
}
