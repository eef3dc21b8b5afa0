//! File watcher that turns arriving site exports into sync jobs.
//!
//! # Architecture
//!
//! ```text
//! notify::RecommendedWatcher (non-recursive, working directory)
//!         |
//!   ArchiveWatcher loop --- Debouncer (settles arrivals)
//!         |
//!   handlers (ArchiveFileHandler) -> WatchAction::Process
//!         |
//!   bounded queue -> single worker -> Pipeline::run (blocking pool)
//!         |
//!   SyncBroadcaster -> SyncEvent subscribers
//! ```
//!
//! The worker takes one archive at a time, so two exports landing together
//! never interleave their deletes and copies.

mod archive_watcher;
mod debouncer;
mod error;
mod event;
mod handler;
pub mod handlers;
mod notifications;

pub use archive_watcher::{ArchiveWatcher, ArchiveWatcherBuilder, WatcherHandle};
pub use debouncer::Debouncer;
pub use error::WatchError;
pub use event::{Change, classify};
pub use handler::{WatchAction, WatchHandler};
pub use notifications::{SyncBroadcaster, SyncEvent};
