//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// A typical site editor export.
pub const EXPORT_ENTRIES: &[(&str, &str)] = &[
    ("theme/style.css", "/* Theme Name: Exported */"),
    ("theme/theme.json", r#"{"version": 2}"#),
    ("theme/templates/index.html", "<!-- wp:post-content /-->"),
    ("theme/templates/single.html", "<!-- wp:post-title /-->"),
    ("theme/parts/header.html", "<!-- wp:site-title /-->"),
    ("theme/parts/footer.html", "<!-- wp:site-tagline /-->"),
];

/// Build zip bytes from `(name, content)` pairs. Names ending in `/` are directories.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, SimpleFileOptions::default())
                .unwrap();
        } else {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    fs::write(path, zip_bytes(entries)).unwrap();
}

/// A theme root with stale destinations and an unrelated file.
pub fn seeded_theme_root() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = fs::canonicalize(temp.path()).unwrap();

    fs::create_dir_all(root.join("templates")).unwrap();
    fs::write(root.join("templates/old.html"), "old template").unwrap();
    fs::create_dir_all(root.join("parts")).unwrap();
    fs::write(root.join("parts/old.html"), "old part").unwrap();
    fs::write(root.join("functions.php"), "<?php // untouched").unwrap();

    (temp, root)
}
