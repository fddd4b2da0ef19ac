//! Per-file orchestration.
//!
//! Runs one media file through the chapter lifecycle:
//!
//! ```text
//! cancel check
//!     ├── tool preflight (unless skip_check)
//!     ├── read chapters          (none → Skipped)
//!     ├── backup snapshot        (unless no_backup)
//!     ├── per chapter: plan → sample → recognize → render title
//!     └── persist                (only if a chapter was renamed)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mcn_core::orchestrator::{FileContext, RecognitionOrchestrator};
//!
//! let orchestrator = RecognitionOrchestrator::from_toolchain(&toolchain);
//! let ctx = FileContext::new("/media/live.mkv", config);
//! let result = orchestrator.process_file(&ctx)?;
//! println!("Recognized: {}", result.counts.recognized);
//! ```

mod errors;
mod processor;
mod types;

pub use errors::FileError;
pub use processor::RecognitionOrchestrator;
pub use types::{
    CancelHandle, ChapterCounts, ChapterOutcome, FileContext, OutcomeKind, ProcessingResult,
    ProgressCallback, SkipReason, Verdict,
};

#[cfg(test)]
pub(crate) use processor::fakes;
