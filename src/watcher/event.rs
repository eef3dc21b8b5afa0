//! Reduces raw notify events to the three changes the watcher acts on.

use std::path::PathBuf;

use notify::Event;
use notify::event::{AccessKind, AccessMode, EventKind, ModifyKind, RenameMode};

use crate::paths::path_exists;

/// What happened to a path, from the watcher's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// A file appeared: created, or renamed into the directory.
    Arrived,
    /// An already-seen file was written to.
    Written,
    /// A file left: removed, or renamed away.
    Gone,
}

/// Classify a notify event into per-path changes.
pub fn classify(event: &Event) -> Vec<(PathBuf, Change)> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            tagged(&event.paths, Change::Arrived)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            // paths are [from, to]
            let mut changes = Vec::with_capacity(2);
            if let [from, .., to] = event.paths.as_slice() {
                changes.push((from.clone(), Change::Gone));
                changes.push((to.clone(), Change::Arrived));
            }
            changes
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => {
            tagged(&event.paths, Change::Gone)
        }
        // FSEvents does not say which side of a rename a path is on
        EventKind::Modify(ModifyKind::Name(RenameMode::Any | RenameMode::Other)) => event
            .paths
            .iter()
            .map(|path| {
                let change = if path_exists(path) {
                    Change::Arrived
                } else {
                    Change::Gone
                };
                (path.clone(), change)
            })
            .collect(),
        EventKind::Modify(_) | EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
            tagged(&event.paths, Change::Written)
        }
        _ => Vec::new(),
    }
}

fn tagged(paths: &[PathBuf], change: Change) -> Vec<(PathBuf, Change)> {
    paths.iter().map(|path| (path.clone(), change)).collect()
}
