//! Filesystem helpers used by the sync pipeline.
//!
//! Deletion is best-effort: [`delete_path`] treats a missing path as success
//! and hands every other failure back to the caller, which decides whether to
//! log it, record it or escalate it.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// What [`delete_path`] found at the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Something existed and was removed.
    Deleted,
    /// Nothing was there to begin with.
    Absent,
}

/// Check whether a file or directory exists at `path`.
///
/// Never fails. Any error while querying metadata (permissions, broken
/// parent components) is reported as "does not exist".
pub fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Recursively delete a file or directory.
///
/// Idempotent: a path that is already gone yields `Ok(Removal::Absent)`.
pub fn delete_path(path: &Path) -> io::Result<Removal> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Removal::Absent),
        Err(e) => return Err(e),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(Removal::Deleted),
        // Raced with another deleter
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Removal::Absent),
        Err(e) => Err(e),
    }
}

/// Copy the contents of `src` into `dst`, merging with whatever is there.
///
/// Existing files are overwritten. A regular file standing where a directory
/// has to go is replaced; a directory standing where a file has to go is an
/// error. Returns the number of files copied.
pub fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<usize> {
    if !src.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source directory {} does not exist", src.display()),
        ));
    }

    fs::create_dir_all(dst)?;
    let mut copied = 0;

    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if target.is_file() {
                fs::remove_file(&target)?;
            }
            fs::create_dir_all(&target)?;
        } else {
            if target.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!(
                        "cannot overwrite directory {} with a file",
                        target.display()
                    ),
                ));
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}
