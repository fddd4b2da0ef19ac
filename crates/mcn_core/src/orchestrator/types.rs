//! Core types for per-file processing.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::config::Config;
use crate::recognition::SongInfo;

/// Progress callback type for reporting per-chapter progress.
///
/// Arguments: (media_path, chapter_number starting at 1, chapter_count)
pub type ProgressCallback = Box<dyn Fn(&Path, usize, usize) + Send + Sync>;

/// Handle for cancelling processing from another thread.
///
/// Checked before each chapter, before persisting, and between files.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Everything processing one file needs, passed explicitly.
pub struct FileContext {
    /// Media file to read chapters from.
    pub media_path: PathBuf,
    /// Write results here instead of modifying `media_path`.
    pub output: Option<PathBuf>,
    /// Resolved configuration.
    pub config: Config,
    /// Cancellation flag shared with the caller.
    pub cancel: CancelHandle,
    progress_callback: Option<ProgressCallback>,
}

impl FileContext {
    pub fn new(media_path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            media_path: media_path.into(),
            output: None,
            config,
            cancel: CancelHandle::new(),
            progress_callback: None,
        }
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, chapter_number: usize, total: usize) {
        if let Some(ref callback) = self.progress_callback {
            callback(&self.media_path, chapter_number, total);
        }
    }

    /// File that receives the written chapters.
    pub fn target_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.media_path)
    }

    /// Whether results go to a separate output file.
    pub fn writes_copy(&self) -> bool {
        matches!(&self.output, Some(out) if out != &self.media_path)
    }
}

/// Per-file chapter tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChapterCounts {
    pub recognized: usize,
    pub unrecognized: usize,
    pub extraction_failed: usize,
}

impl ChapterCounts {
    pub fn total(&self) -> usize {
        self.recognized + self.unrecognized + self.extraction_failed
    }

    pub fn add(&mut self, other: &ChapterCounts) {
        self.recognized += other.recognized;
        self.unrecognized += other.unrecognized;
        self.extraction_failed += other.extraction_failed;
    }
}

/// What happened to one chapter.
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeKind {
    /// Renamed from a recognized song.
    Recognized { title: String, song: SongInfo },
    /// Sample taken but no song identified; `reason` is set when the
    /// service failed rather than answering "no match".
    Unrecognized { reason: Option<String> },
    /// The audio sample could not be extracted.
    SampleFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterOutcome {
    pub index: usize,
    pub uid: String,
    pub original_title: String,
    pub kind: OutcomeKind,
}

/// Why a file was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A chapter backup already exists.
    AlreadyProcessed,
    /// The file has no chapters.
    NoChapters,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyProcessed => f.write_str("already processed (backup exists)"),
            SkipReason::NoChapters => f.write_str("no chapters"),
        }
    }
}

/// Final verdict for one file.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Chapters processed (whether or not any title changed).
    Success,
    /// Chapters restored from a backup.
    Restored,
    Skipped(SkipReason),
    Failed(String),
}

/// Result of processing one file.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub media_path: PathBuf,
    pub started_at: DateTime<Local>,
    pub counts: ChapterCounts,
    pub outcomes: Vec<ChapterOutcome>,
    pub verdict: Verdict,
    /// Backup written or found for this file.
    pub backup_path: Option<PathBuf>,
    /// File whose chapters were rewritten, if any.
    pub written_to: Option<PathBuf>,
}

impl ProcessingResult {
    pub fn new(media_path: impl Into<PathBuf>) -> Self {
        Self {
            media_path: media_path.into(),
            started_at: Local::now(),
            counts: ChapterCounts::default(),
            outcomes: Vec::new(),
            verdict: Verdict::Success,
            backup_path: None,
            written_to: None,
        }
    }

    pub fn skipped(media_path: impl Into<PathBuf>, reason: SkipReason) -> Self {
        Self {
            verdict: Verdict::Skipped(reason),
            ..Self::new(media_path)
        }
    }

    pub fn failure(media_path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Failed(error.into()),
            ..Self::new(media_path)
        }
    }

    /// Record a chapter outcome and update the tallies.
    pub fn push_outcome(&mut self, outcome: ChapterOutcome) {
        match outcome.kind {
            OutcomeKind::Recognized { .. } => self.counts.recognized += 1,
            OutcomeKind::Unrecognized { .. } => self.counts.unrecognized += 1,
            OutcomeKind::SampleFailed { .. } => self.counts.extraction_failed += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.verdict, Verdict::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.verdict, Verdict::Skipped(_))
    }
}
