//! Per-archive processing: extract, then sync.
//!
//! Each archive moves through `Idle -> Extracting -> Syncing` and ends in
//! either `Succeeded` or `Failed`. There is no retry; a failed archive stays
//! failed until it arrives again.

use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

use crate::archive::{ExtractionError, extract_archive};
use crate::paths::delete_path;
use crate::sync::{SyncError, SyncReport, Synchronizer};

/// Default name of the scratch directory archives are unpacked into.
pub const DEFAULT_TEMP_DIR: &str = "__temp_dir__";
/// Default directory inside the archive holding the theme files.
pub const DEFAULT_THEME_DIR: &str = "theme";
/// Default destination directories replaced on every sync.
pub const DEFAULT_DESTINATIONS: [&str; 2] = ["templates", "parts"];

/// Paths a pipeline operates on. All of them are already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Theme root receiving the copied files.
    pub root: PathBuf,
    /// Scratch directory for extraction.
    pub temp_dir: PathBuf,
    /// Directory inside the extracted tree to copy, relative to `temp_dir`.
    pub theme_dir: PathBuf,
    /// Directories deleted before copying.
    pub destinations: Vec<PathBuf>,
}

impl PipelineConfig {
    /// Defaults rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            temp_dir: root.join(DEFAULT_TEMP_DIR),
            theme_dir: PathBuf::from(DEFAULT_THEME_DIR),
            destinations: DEFAULT_DESTINATIONS.iter().map(|d| root.join(d)).collect(),
            root,
        }
    }

    /// Location of the extracted theme directory.
    pub fn theme_source(&self) -> PathBuf {
        self.temp_dir.join(&self.theme_dir)
    }
}

/// Lifecycle of a single archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveState {
    Idle,
    Extracting,
    Syncing,
    Succeeded,
    Failed,
}

impl fmt::Display for ArchiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchiveState::Idle => "idle",
            ArchiveState::Extracting => "extracting",
            ArchiveState::Syncing => "syncing",
            ArchiveState::Succeeded => "succeeded",
            ArchiveState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why an archive ended in [`ArchiveState::Failed`].
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Moving the data failed: {0}")]
    Sync(#[from] SyncError),
}

impl PipelineError {
    /// The state the archive was in when it failed.
    pub fn stage(&self) -> ArchiveState {
        match self {
            PipelineError::Extraction(_) => ArchiveState::Extracting,
            PipelineError::Sync(_) => ArchiveState::Syncing,
        }
    }
}

/// Runs archives through extraction and sync one at a time.
///
/// The destination region is guarded by a mutex, so concurrent callers
/// are serialized rather than interleaving deletes and copies.
pub struct Pipeline {
    config: PipelineConfig,
    region: Mutex<()>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            region: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract `archive` and sync it into the theme root.
    ///
    /// Blocks on filesystem work; async callers should use `spawn_blocking`.
    pub fn run(&self, archive: &Path) -> Result<SyncReport, PipelineError> {
        let _guard = self.region.lock();
        let mut state = ArchiveState::Idle;

        let result = self.run_stages(archive, &mut state);
        let end = if result.is_ok() {
            ArchiveState::Succeeded
        } else {
            ArchiveState::Failed
        };
        transition(archive, state, end);

        result
    }

    fn run_stages(
        &self,
        archive: &Path,
        state: &mut ArchiveState,
    ) -> Result<SyncReport, PipelineError> {
        transition(archive, *state, ArchiveState::Extracting);
        *state = ArchiveState::Extracting;

        // Leftovers of an earlier failed run must not leak into this one
        if let Err(e) = delete_path(&self.config.temp_dir) {
            tracing::warn!(
                "[pipeline] could not clear {}: {e}",
                self.config.temp_dir.display()
            );
        }

        let stats = extract_archive(archive, &self.config.temp_dir).inspect_err(|e| {
            tracing::error!(
                "[pipeline] couldn't extract {}: {}",
                archive.display(),
                error_chain(e)
            );
        })?;
        crate::debug_event!(
            "pipeline",
            "extracted",
            "{} files, {} dirs, {} skipped",
            stats.files,
            stats.dirs,
            stats.skipped
        );

        transition(archive, *state, ArchiveState::Syncing);
        *state = ArchiveState::Syncing;

        let report = Synchronizer::new(&self.config)
            .sync(archive)
            .inspect_err(|e| {
                tracing::error!(
                    "[pipeline] error moving data from {}: {}",
                    archive.display(),
                    error_chain(e)
                );
            })?;

        Ok(report)
    }
}

fn transition(archive: &Path, from: ArchiveState, to: ArchiveState) {
    crate::debug_event!("pipeline", "state", "{} {from} -> {to}", archive.display());
}

/// Render an error with all of its sources, outermost first.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // thiserror messages often embed their source already
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}
