//! Error types for archive extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while unpacking an exported site archive.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Cannot open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive {path} is corrupt or not a zip file: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Cannot read entry {index} of {path}: {source}")]
    Entry {
        path: PathBuf,
        index: usize,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
