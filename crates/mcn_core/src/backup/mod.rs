//! Chapter backups.
//!
//! Before titles are rewritten the original chapter list is saved as JSON
//! next to the media file. The presence of that file is also how batch runs
//! recognise already-processed media. Backups are never deleted.

mod manager;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use manager::{backup_path_for, BackupManager, BackupRecord, BACKUP_EXTENSION};

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Backup file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read backup {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write backup {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Malformed backup {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("Backup {} contains no chapters", .0.display())]
    Empty(PathBuf),
}

pub type BackupResult<T> = Result<T, BackupError>;
