//! Sequential multi-file processing.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::orchestrator::{
    CancelHandle, ChapterCounts, FileContext, ProcessingResult, ProgressCallback,
    RecognitionOrchestrator, SkipReason, Verdict,
};

/// What to do with each file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Recognize and rename chapters.
    #[default]
    Rename,
    /// Put backed-up chapters back. `backup_file` only applies to a
    /// single-file run.
    Restore { backup_file: Option<PathBuf> },
}

/// Aggregated outcome of a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Set when processing stopped early on request.
    pub cancelled: bool,
    /// Chapter tallies summed over all processed files.
    pub chapters: ChapterCounts,
    pub results: Vec<ProcessingResult>,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Fold one file's result into the summary.
    pub fn record(&mut self, result: ProcessingResult) {
        match result.verdict {
            Verdict::Success | Verdict::Restored => self.succeeded += 1,
            Verdict::Skipped(_) => self.skipped += 1,
            Verdict::Failed(_) => self.failed += 1,
        }
        self.chapters.add(&result.counts);
        self.results.push(result);
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Files that were never reached because of cancellation.
    pub fn not_reached(&self) -> usize {
        self.total
            .saturating_sub(self.succeeded + self.failed + self.skipped)
    }

    pub fn log_summary(&self) {
        tracing::info!("========================================");
        tracing::info!("Total files: {}", self.total);
        tracing::info!("Succeeded:   {}", self.succeeded);
        tracing::info!("Failed:      {}", self.failed);
        tracing::info!("Skipped:     {}", self.skipped);
        if self.cancelled {
            tracing::warn!("Cancelled:   {} not processed", self.not_reached());
        }
        tracing::info!(
            "Chapters: {} recognized, {} unrecognized, {} sample failures",
            self.chapters.recognized,
            self.chapters.unrecognized,
            self.chapters.extraction_failed
        );
        tracing::info!("========================================");
    }
}

/// Runs files through the orchestrator one at a time.
///
/// A failing file is logged and counted; it never stops the batch.
pub struct BatchController {
    orchestrator: RecognitionOrchestrator,
    mode: RunMode,
    force: bool,
    cancel: CancelHandle,
}

impl BatchController {
    pub fn new(orchestrator: RecognitionOrchestrator, mode: RunMode) -> Self {
        Self {
            orchestrator,
            mode,
            force: false,
            cancel: CancelHandle::new(),
        }
    }

    /// Process files even when a backup shows they were done before.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get a handle that stops the batch at the next file or chapter.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Whether a file should be skipped as already processed.
    pub fn should_skip(&self, file: &Path) -> bool {
        self.mode == RunMode::Rename && !self.force && self.orchestrator.backups().exists(file)
    }

    /// Process `files` in order.
    pub fn run(&self, files: &[PathBuf], config: &Config) -> BatchSummary {
        self.run_with_progress(files, config, |_| None)
    }

    /// Process `files` in order with a per-file progress callback.
    pub fn run_with_progress<G>(
        &self,
        files: &[PathBuf],
        config: &Config,
        progress_callback_factory: G,
    ) -> BatchSummary
    where
        G: Fn(&Path) -> Option<ProgressCallback>,
    {
        let mut summary = BatchSummary::new(files.len());

        for (i, file) in files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!("Batch cancelled at file {}/{}", i + 1, files.len());
                summary.cancelled = true;
                break;
            }

            if self.should_skip(file) {
                tracing::info!("Skipping (already processed): {}", file.display());
                summary.record(ProcessingResult::skipped(file, SkipReason::AlreadyProcessed));
                continue;
            }

            tracing::info!("[{}/{}] {}", i + 1, files.len(), file.display());

            let backup_file = match &self.mode {
                RunMode::Restore { backup_file } if files.len() == 1 => backup_file.clone(),
                _ => None,
            };
            let mut ctx = FileContext::new(file, config.clone())
                .with_cancel_handle(self.cancel.clone());
            if files.len() == 1 {
                ctx = ctx.with_output(config.output.clone());
            }
            if let Some(callback) = progress_callback_factory(file) {
                ctx = ctx.with_progress_callback(callback);
            }

            match self.process(&ctx, backup_file.as_deref()) {
                Some(result) => summary.record(result),
                None => {
                    summary.cancelled = true;
                    break;
                }
            }
        }

        summary.log_summary();
        summary
    }

    /// Process one file; `None` when it was cancelled.
    fn process(&self, ctx: &FileContext, backup_file: Option<&Path>) -> Option<ProcessingResult> {
        let outcome = match &self.mode {
            RunMode::Rename => self.orchestrator.process_file(ctx),
            RunMode::Restore { .. } => self.orchestrator.restore_file(ctx, backup_file),
        };

        match outcome {
            Ok(result) => {
                match &result.verdict {
                    Verdict::Skipped(reason) => {
                        tracing::info!("Skipped {}: {}", ctx.media_path.display(), reason)
                    }
                    _ => tracing::info!("Done: {}", ctx.media_path.display()),
                }
                Some(result)
            }
            Err(e) if e.is_cancelled() => {
                tracing::warn!("{}", e);
                None
            }
            Err(e) => {
                tracing::error!("Failed: {}", e);
                Some(ProcessingResult::failure(&ctx.media_path, e.to_string()))
            }
        }
    }
}
