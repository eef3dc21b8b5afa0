//! Zip extraction backed by the `zip` crate.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use zip::ZipArchive;

use super::ExtractionError;

/// Counts gathered while extracting an archive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: usize,
    pub dirs: usize,
    /// Entries skipped because their names escape the destination.
    pub skipped: usize,
}

/// Extract every entry of the zip at `archive_path` into `dest_dir`.
///
/// `dest_dir` is created when missing and files already present at an
/// entry's location are overwritten. Entries with absolute names or `..`
/// components are skipped. Nothing is rolled back if extraction stops
/// half way.
pub fn extract_archive(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<ExtractStats, ExtractionError> {
    let file = File::open(archive_path).map_err(|source| ExtractionError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let mut archive = ZipArchive::new(file).map_err(|source| ExtractionError::Corrupt {
        path: archive_path.to_path_buf(),
        source,
    })?;

    fs::create_dir_all(dest_dir).map_err(|e| ExtractionError::io(dest_dir, e))?;

    let mut stats = ExtractStats::default();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|source| ExtractionError::Entry {
                path: archive_path.to_path_buf(),
                index,
                source,
            })?;

        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(
                "[extract] skipping unsafe entry '{}' in {}",
                entry.name(),
                archive_path.display()
            );
            stats.skipped += 1;
            continue;
        };

        let output_path = dest_dir.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&output_path).map_err(|e| ExtractionError::io(&output_path, e))?;
            stats.dirs += 1;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ExtractionError::io(parent, e))?;
        }

        let mut output = File::create(&output_path).map_err(|e| ExtractionError::io(&output_path, e))?;
        io::copy(&mut entry, &mut output).map_err(|e| ExtractionError::io(&output_path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                // Keep the owner able to clean up after us
                let mode = (mode & 0o777) | 0o600;
                fs::set_permissions(&output_path, fs::Permissions::from_mode(mode))
                    .map_err(|e| ExtractionError::io(&output_path, e))?;
            }
        }

        crate::debug_event!("extract", "wrote", "{}", relative.display());
        stats.files += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extract_preserves_hierarchy() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("edit-site-export.zip");
        fs::write(
            &archive,
            build_zip(&[
                ("theme/", ""),
                ("theme/templates/index.html", "<!-- index -->"),
                ("theme/parts/header.html", "<!-- header -->"),
            ]),
        )
        .unwrap();

        let dest = temp.path().join("__temp_dir__");
        let stats = extract_archive(&archive, &dest).unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.dirs, 1);
        assert_eq!(stats.skipped, 0);
        assert_eq!(
            fs::read_to_string(dest.join("theme/templates/index.html")).unwrap(),
            "<!-- index -->"
        );
        assert_eq!(
            fs::read_to_string(dest.join("theme/parts/header.html")).unwrap(),
            "<!-- header -->"
        );
    }

    #[test]
    fn test_extract_overwrites_existing_files() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("export.zip");
        fs::write(&archive, build_zip(&[("theme/style.css", "fresh")])).unwrap();

        let dest = temp.path().join("out");
        fs::create_dir_all(dest.join("theme")).unwrap();
        fs::write(dest.join("theme/style.css"), "stale stale stale").unwrap();

        extract_archive(&archive, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("theme/style.css")).unwrap(), "fresh");
    }

    #[test]
    fn test_extract_skips_entries_escaping_destination() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("export.zip");
        fs::write(
            &archive,
            build_zip(&[("../escaped.txt", "nope"), ("theme/ok.txt", "ok")]),
        )
        .unwrap();

        let dest = temp.path().join("nested/out");
        let stats = extract_archive(&archive, &dest).unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.files, 1);
        assert!(!temp.path().join("nested/escaped.txt").exists());
        assert!(dest.join("theme/ok.txt").exists());
    }

    #[test]
    fn test_extract_missing_archive() {
        let temp = TempDir::new().unwrap();
        let err = extract_archive(&temp.path().join("missing.zip"), &temp.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Open { .. }));
        assert!(!temp.path().join("out").exists());
    }

    #[test]
    fn test_extract_corrupt_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("edit-site-export.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let err = extract_archive(&archive, &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, ExtractionError::Corrupt { .. }));
        assert!(err.to_string().contains("edit-site-export.zip"));
    }
}
