//! Replaces destination directories with content from an extracted export.

mod error;
mod synchronizer;

pub use error::SyncError;
pub use synchronizer::{CleanupFailure, SyncReport, Synchronizer};
