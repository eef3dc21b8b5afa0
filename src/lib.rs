pub mod archive;
pub mod cli;
pub mod config;
pub mod display;
pub mod logging;
pub mod paths;
pub mod pipeline;
pub mod sync;
pub mod watcher;

pub use archive::{ExtractStats, ExtractionError, extract_archive};
pub use config::{ConfigError, Settings};
pub use pipeline::{ArchiveState, Pipeline, PipelineConfig, PipelineError};
pub use sync::{SyncError, SyncReport, Synchronizer};
pub use watcher::{ArchiveWatcher, SyncBroadcaster, SyncEvent, WatchError, WatcherHandle};
