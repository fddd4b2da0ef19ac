//! Media file discovery.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extension of the media files the batch processes.
pub const MEDIA_EXTENSION: &str = "mkv";

fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(MEDIA_EXTENSION))
        .unwrap_or(false)
}

/// Find media files under `dir`, sorted by path.
///
/// Only the top level is scanned unless `recursive` is set. Unreadable
/// entries are logged and skipped.
pub fn discover_media_files(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_media_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    tracing::debug!("Found {} media files in {}", files.len(), dir.display());
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_mkv_files_case_insensitively_and_sorted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.mkv"), b"").unwrap();
        fs::write(dir.path().join("A.MKV"), b"").unwrap();
        fs::write(dir.path().join("c.mp4"), b"").unwrap();
        fs::write(dir.path().join("b.chapters.backup.json"), b"[]").unwrap();

        let files = discover_media_files(dir.path(), false);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.MKV", "b.mkv"]);
    }

    #[test]
    fn recursion_is_opt_in() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("disc2")).unwrap();
        fs::write(dir.path().join("one.mkv"), b"").unwrap();
        fs::write(dir.path().join("disc2").join("two.mkv"), b"").unwrap();

        assert_eq!(discover_media_files(dir.path(), false).len(), 1);
        assert_eq!(discover_media_files(dir.path(), true).len(), 2);
    }
}
