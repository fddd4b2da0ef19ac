//! Error types for per-file processing.
//!
//! Every variant names the file it happened to, so batch logs stay
//! readable without extra context.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::backup::BackupError;
use crate::chapters::ChapterError;
use crate::tools::ToolError;

/// Fatal error for one media file. Other files in a batch are unaffected.
#[derive(Error, Debug)]
pub enum FileError {
    /// A required tool could not be found during preflight.
    #[error("{file}: {source}")]
    ToolUnavailable {
        file: String,
        #[source]
        source: ToolError,
    },

    /// Reading the chapter list failed.
    #[error("{file}: {source}")]
    ChapterRead {
        file: String,
        #[source]
        source: ChapterError,
    },

    /// Writing or reading the chapter backup failed.
    #[error("{file}: {source}")]
    Backup {
        file: String,
        #[source]
        source: BackupError,
    },

    /// Copying the source to the output location failed.
    #[error("{file}: failed to copy to {}: {source}", output.display())]
    OutputCopy {
        file: String,
        output: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Persisting the renamed chapters failed.
    #[error("{file}: {source}{note}")]
    ChapterWrite {
        file: String,
        note: String,
        #[source]
        source: ChapterError,
    },

    /// Processing was interrupted before anything was written.
    #[error("{file}: cancelled")]
    Cancelled { file: String },
}

/// Display name used in error messages.
pub fn display_name(path: &Path) -> String {
    path.display().to_string()
}

impl FileError {
    pub fn tool_unavailable(path: &Path, source: ToolError) -> Self {
        Self::ToolUnavailable {
            file: display_name(path),
            source,
        }
    }

    pub fn chapter_read(path: &Path, source: ChapterError) -> Self {
        Self::ChapterRead {
            file: display_name(path),
            source,
        }
    }

    pub fn backup(path: &Path, source: BackupError) -> Self {
        Self::Backup {
            file: display_name(path),
            source,
        }
    }

    pub fn output_copy(path: &Path, output: &Path, source: io::Error) -> Self {
        Self::OutputCopy {
            file: display_name(path),
            output: output.to_path_buf(),
            source,
        }
    }

    /// Write failure; `backup` is mentioned so the user knows where the
    /// original titles are.
    pub fn chapter_write(path: &Path, backup: Option<&Path>, source: ChapterError) -> Self {
        let note = backup
            .map(|b| format!(" (original chapters are backed up in {})", b.display()))
            .unwrap_or_default();
        Self::ChapterWrite {
            file: display_name(path),
            note,
            source,
        }
    }

    pub fn cancelled(path: &Path) -> Self {
        Self::Cancelled {
            file: display_name(path),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FileError::Cancelled { .. })
    }
}
