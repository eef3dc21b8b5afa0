//! Error types for the copy step of a sync.

use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a sync.
///
/// Only the copy step produces these. Deleting destinations, the temporary
/// directory or the archive never fails a sync; those problems end up in
/// [`SyncReport::cleanup_failures`](super::SyncReport) instead.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Extracted export has no '{}' directory at {}", .expected.display(), .path.display())]
    MissingTheme { path: PathBuf, expected: PathBuf },

    #[error("Failed to copy {from} into {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
