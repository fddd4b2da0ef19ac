//! Chapter backup files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chapters::{format_timestamp_ns, parse_timestamp_ns, Chapter};
use crate::fs_util::write_atomic;

use super::{BackupError, BackupResult};

/// Extension that replaces the media extension for backups.
pub const BACKUP_EXTENSION: &str = "chapters.backup.json";

/// One chapter as stored in a backup file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct BackupEntry {
    #[serde(default)]
    uid: String,
    start_time: String,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    title: String,
}

impl From<&Chapter> for BackupEntry {
    fn from(chapter: &Chapter) -> Self {
        Self {
            uid: chapter.uid.clone(),
            start_time: format_timestamp_ns(chapter.start_ns),
            end_time: chapter.end_ns.map(format_timestamp_ns),
            title: chapter.title.clone(),
        }
    }
}

/// A written backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub path: PathBuf,
    pub chapters: Vec<Chapter>,
}

/// Deterministic backup location for a media file.
///
/// `show.mkv` → `show.chapters.backup.json`, next to the media file.
pub fn backup_path_for(media_path: &Path) -> PathBuf {
    media_path.with_extension(BACKUP_EXTENSION)
}

/// Writes and reads chapter snapshots.
#[derive(Debug, Clone, Default)]
pub struct BackupManager;

impl BackupManager {
    pub fn new() -> Self {
        Self
    }

    /// Whether a backup exists for `media_path`.
    pub fn exists(&self, media_path: &Path) -> bool {
        backup_path_for(media_path).is_file()
    }

    /// Write the chapter list to the backup file of `media_path`.
    pub fn snapshot(&self, chapters: &[Chapter], media_path: &Path) -> BackupResult<BackupRecord> {
        let path = backup_path_for(media_path);
        let entries: Vec<BackupEntry> = chapters.iter().map(BackupEntry::from).collect();
        let mut json = serde_json::to_string_pretty(&entries)
            .map_err(|e| BackupError::Malformed {
                path: path.clone(),
                message: e.to_string(),
            })?;
        json.push('\n');

        write_atomic(&path, &json).map_err(|e| BackupError::Write {
            path: path.clone(),
            source: e,
        })?;

        tracing::info!("Backed up {} chapters to {}", chapters.len(), path.display());

        Ok(BackupRecord {
            path,
            chapters: chapters.to_vec(),
        })
    }

    /// Read chapters back from a backup.
    ///
    /// `backup_file` overrides the deterministic location.
    pub fn restore(&self, media_path: &Path, backup_file: Option<&Path>) -> BackupResult<Vec<Chapter>> {
        let path = backup_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| backup_path_for(media_path));
        self.load(&path)
    }

    /// Read and validate a backup file.
    pub fn load(&self, path: &Path) -> BackupResult<Vec<Chapter>> {
        if !path.is_file() {
            return Err(BackupError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| BackupError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let entries: Vec<BackupEntry> =
            serde_json::from_str(&content).map_err(|e| BackupError::Malformed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if entries.is_empty() {
            return Err(BackupError::Empty(path.to_path_buf()));
        }

        let chapters = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let bad_time = |value: &str| BackupError::Malformed {
                    path: path.to_path_buf(),
                    message: format!("chapter {}: invalid time '{}'", i + 1, value),
                };
                let start_ns =
                    parse_timestamp_ns(&entry.start_time).ok_or_else(|| bad_time(&entry.start_time))?;
                let end_ns = match entry.end_time.as_deref() {
                    Some(end) => Some(parse_timestamp_ns(end).ok_or_else(|| bad_time(end))?),
                    None => None,
                };
                Ok(Chapter {
                    uid: entry.uid,
                    start_ns,
                    end_ns,
                    title: entry.title,
                })
            })
            .collect::<BackupResult<Vec<_>>>()?;

        tracing::info!("Loaded {} chapters from {}", chapters.len(), path.display());
        Ok(chapters)
    }
}
