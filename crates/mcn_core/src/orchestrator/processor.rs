//! Per-file recognition and renaming.

use std::fs;
use std::path::Path;

use crate::backup::BackupManager;
use crate::chapters::{ChapterSource, ChapterState, ChapterStore, MkvToolnix};
use crate::recognition::{CommandRecognizer, Recognition, RecognitionService};
use crate::sampling::{plan, AudioSampler, FfmpegSampler};
use crate::template::render;
use crate::tools::{ToolError, Toolchain};

use super::errors::FileError;
use super::types::{
    ChapterOutcome, FileContext, OutcomeKind, ProcessingResult, SkipReason, Verdict,
};

/// Drives chapters of one file through sampling, recognition and renaming.
///
/// Collaborators are injected so tests can replace the external tools.
pub struct RecognitionOrchestrator {
    chapters: Box<dyn ChapterSource>,
    sampler: Box<dyn AudioSampler>,
    recognizer: Box<dyn RecognitionService>,
    backups: BackupManager,
}

impl RecognitionOrchestrator {
    pub fn new(
        chapters: Box<dyn ChapterSource>,
        sampler: Box<dyn AudioSampler>,
        recognizer: Box<dyn RecognitionService>,
    ) -> Self {
        Self {
            chapters,
            sampler,
            recognizer,
            backups: BackupManager::new(),
        }
    }

    /// Build an orchestrator over the real external tools.
    pub fn from_toolchain(tools: &Toolchain) -> Self {
        Self::new(
            Box::new(MkvToolnix::new(&tools.mkvextract, &tools.mkvpropedit)),
            Box::new(FfmpegSampler::new(&tools.ffmpeg)),
            Box::new(CommandRecognizer::new(&tools.recognizer)),
        )
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Check every collaborator needed for a rename run.
    pub fn preflight(&self) -> Result<(), ToolError> {
        self.chapters.check_available()?;
        self.sampler.check_available()?;
        self.recognizer.check_available()?;
        Ok(())
    }

    /// Run every chapter in `store` through the recognition lifecycle.
    ///
    /// Each chapter ends in a terminal state. Titles are rewritten in the
    /// store only; nothing is persisted here.
    pub fn recognize_chapters(
        &self,
        ctx: &FileContext,
        store: &mut ChapterStore,
    ) -> Result<ProcessingResult, FileError> {
        let mut result = ProcessingResult::new(&ctx.media_path);
        let total = store.len();
        let settings = &ctx.config.recognition;

        let chapters = store.chapters().to_vec();
        let spans = store.spans();

        for (index, (chapter, span)) in chapters.into_iter().zip(spans).enumerate() {
            if ctx.cancel.is_cancelled() {
                tracing::warn!("Cancelled before chapter {}/{}", index + 1, total);
                return Err(FileError::cancelled(&ctx.media_path));
            }
            ctx.report_progress(index + 1, total);

            let window = plan(span, settings);

            tracing::info!(
                "[{}/{}] {} ({})",
                index + 1,
                total,
                chapter.title,
                chapter.format_start_time()
            );
            tracing::debug!(
                "Sampling {} at +{:.2}s for {:.2}s",
                settings.strategy,
                window.offset_ns as f64 / 1e9,
                window.duration_ns as f64 / 1e9
            );

            let outcome_kind = match self.sampler.extract_sample(&ctx.media_path, &window) {
                Err(e) => {
                    tracing::warn!("Sample extraction failed for chapter {}: {}", index + 1, e);
                    store.mark(index, ChapterState::SampleFailed);
                    OutcomeKind::SampleFailed {
                        reason: e.to_string(),
                    }
                }
                Ok(sample) => {
                    store.mark(index, ChapterState::Sampled);
                    self.identify(ctx, store, index, &sample)
                }
            };

            result.push_outcome(ChapterOutcome {
                index,
                uid: chapter.uid,
                original_title: chapter.title,
                kind: outcome_kind,
            });
        }

        debug_assert!(store.all_terminal());
        Ok(result)
    }

    fn identify(
        &self,
        ctx: &FileContext,
        store: &mut ChapterStore,
        index: usize,
        sample: &crate::recognition::AudioSample,
    ) -> OutcomeKind {
        match self.recognizer.recognize(sample) {
            Ok(Recognition::Match(song)) => {
                let title = render(&ctx.config.template, &song);
                if title.is_empty() {
                    tracing::warn!("Template produced an empty title; keeping original");
                    store.mark(index, ChapterState::Unrecognized);
                    return OutcomeKind::Unrecognized {
                        reason: Some("template produced an empty title".to_string()),
                    };
                }
                tracing::info!("Recognized: {}", title);
                store.rename(index, title.clone());
                OutcomeKind::Recognized { title, song }
            }
            Ok(Recognition::NoMatch) => {
                tracing::info!("No match; keeping original title");
                store.mark(index, ChapterState::Unrecognized);
                OutcomeKind::Unrecognized { reason: None }
            }
            Err(e) => {
                tracing::warn!("Recognition failed for chapter {}: {}", index + 1, e);
                store.mark(index, ChapterState::Unrecognized);
                OutcomeKind::Unrecognized {
                    reason: Some(e.to_string()),
                }
            }
        }
    }

    /// Recognize and rename the chapters of one file.
    pub fn process_file(&self, ctx: &FileContext) -> Result<ProcessingResult, FileError> {
        let media = ctx.media_path.as_path();

        if ctx.cancel.is_cancelled() {
            return Err(FileError::cancelled(media));
        }

        if !ctx.config.options.skip_check {
            self.preflight()
                .map_err(|e| FileError::tool_unavailable(media, e))?;
        }

        tracing::info!("Processing {}", media.display());

        let chapters = self
            .chapters
            .read_chapters(media)
            .map_err(|e| FileError::chapter_read(media, e))?;

        if chapters.is_empty() {
            tracing::warn!("No chapters found in {}", media.display());
            return Ok(ProcessingResult::skipped(media, SkipReason::NoChapters));
        }

        let backup_path = if ctx.config.options.no_backup {
            None
        } else if self.backups.exists(media) {
            let path = crate::backup::backup_path_for(media);
            tracing::info!("Keeping existing backup {}", path.display());
            Some(path)
        } else {
            let record = self
                .backups
                .snapshot(&chapters, media)
                .map_err(|e| FileError::backup(media, e))?;
            Some(record.path)
        };

        let mut store = ChapterStore::new(media, chapters);
        let mut result = self.recognize_chapters(ctx, &mut store)?;
        result.backup_path = backup_path;

        let renamed = store.renamed_count();
        if renamed == 0 {
            tracing::warn!("No chapters renamed; {} left unchanged", media.display());
            return Ok(result);
        }

        if ctx.cancel.is_cancelled() {
            return Err(FileError::cancelled(media));
        }

        let target = self.persist(ctx, &mut store, result.backup_path.as_deref())?;
        tracing::info!(
            "Renamed {}/{} chapters in {}",
            renamed,
            store.len(),
            target.display()
        );
        result.written_to = Some(target);
        Ok(result)
    }

    /// Write the store's chapters to the context's target file.
    fn persist(
        &self,
        ctx: &FileContext,
        store: &mut ChapterStore,
        backup: Option<&Path>,
    ) -> Result<std::path::PathBuf, FileError> {
        let media = ctx.media_path.as_path();
        let target = ctx.target_path().to_path_buf();

        if ctx.writes_copy() {
            tracing::info!("Copying {} to {}", media.display(), target.display());
            fs::copy(media, &target).map_err(|e| FileError::output_copy(media, &target, e))?;
        }

        self.chapters
            .write_chapters(&target, store.chapters())
            .map_err(|e| FileError::chapter_write(media, backup, e))?;
        store.mark_persisted();
        Ok(target)
    }

    /// Put the backed-up chapters back into the file.
    ///
    /// `backup_file` overrides the default backup location.
    pub fn restore_file(
        &self,
        ctx: &FileContext,
        backup_file: Option<&Path>,
    ) -> Result<ProcessingResult, FileError> {
        let media = ctx.media_path.as_path();

        if ctx.cancel.is_cancelled() {
            return Err(FileError::cancelled(media));
        }

        if !ctx.config.options.skip_check {
            self.chapters
                .check_available()
                .map_err(|e| FileError::tool_unavailable(media, e))?;
        }

        let chapters = self
            .backups
            .restore(media, backup_file)
            .map_err(|e| FileError::backup(media, e))?;

        for (i, chapter) in chapters.iter().enumerate().take(5) {
            tracing::info!("  [{}] {} - {}", i + 1, chapter.format_start_time(), chapter.title);
        }
        if chapters.len() > 5 {
            tracing::info!("  ... {} more", chapters.len() - 5);
        }

        let backup_path = backup_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| crate::backup::backup_path_for(media));

        let mut store = ChapterStore::new(media, chapters);
        let target = self.persist(ctx, &mut store, Some(&backup_path))?;

        tracing::info!(
            "Restored {} chapters into {}",
            store.len(),
            target.display()
        );

        let mut result = ProcessingResult::new(media);
        result.verdict = Verdict::Restored;
        result.backup_path = Some(backup_path);
        result.written_to = Some(target);
        Ok(result)
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use crate::backup::backup_path_for;
    use crate::chapters::{Chapter, NS_PER_SEC};
    use crate::config::Config;
    use crate::orchestrator::CancelHandle;
    use crate::recognition::SongInfo;
    use crate::template::TemplateSpec;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn secs(s: u64) -> u64 {
        s * NS_PER_SEC
    }

    fn three_chapters() -> Vec<Chapter> {
        vec![
            Chapter::new("1", 0, "Chapter 1").with_end(secs(60)),
            Chapter::new("2", secs(60), "Chapter 2").with_end(secs(120)),
            Chapter::new("3", secs(120), "Chapter 3").with_end(secs(180)),
        ]
    }

    fn song(name: &str, artists: &[&str]) -> SongInfo {
        SongInfo::new(name, artists.iter().map(|a| a.to_string()).collect())
    }

    struct Harness {
        chapters: FakeChapters,
        sampler: FakeSampler,
        recognizer: FakeRecognizer,
    }

    impl Harness {
        fn new(media: &Path) -> Self {
            Self {
                chapters: FakeChapters::default().with_file(media, three_chapters()),
                sampler: FakeSampler::default(),
                recognizer: FakeRecognizer::default(),
            }
        }

        fn orchestrator(&self) -> RecognitionOrchestrator {
            RecognitionOrchestrator::new(
                Box::new(self.chapters.clone()),
                Box::new(self.sampler.clone()),
                Box::new(self.recognizer.clone()),
            )
        }
    }

    #[test]
    fn start_strategy_samples_five_seconds_in_and_renames_all() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let mut h = Harness::new(&media);
        h.recognizer = FakeRecognizer::default()
            .with_song(0, song("Blue", &["A"]))
            .with_song(60, song("Red", &["B", "C"]))
            .with_song(120, song("Green", &["D"]));

        let result = h
            .orchestrator()
            .process_file(&FileContext::new(&media, Config::default()))
            .unwrap();

        let starts: Vec<u64> = h
            .sampler
            .windows
            .lock()
            .unwrap()
            .iter()
            .map(|w| w.start_ns())
            .collect();
        assert_eq!(starts, vec![secs(5), secs(65), secs(125)]);

        assert_eq!(result.verdict, Verdict::Success);
        assert_eq!(result.counts.recognized, 3);

        let writes = h.chapters.written();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, media);
        let titles: Vec<&str> = writes[0].1.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Blue - A", "Red - B, C", "Green - D"]);

        // Original titles are in the backup.
        let backup = backup_path_for(&media);
        assert_eq!(result.backup_path.as_deref(), Some(backup.as_path()));
        let saved = BackupManager::new().load(&backup).unwrap();
        assert_eq!(saved, three_chapters());
    }

    #[test]
    fn custom_template_uses_first_artist() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let mut h = Harness::new(&media);
        h.recognizer = FakeRecognizer::default().with_song(0, song("Blue", &["A", "B"]));

        let config = Config {
            template: TemplateSpec::parse("{name} by {artist_first}").unwrap(),
            ..Config::default()
        };
        h.orchestrator()
            .process_file(&FileContext::new(&media, config))
            .unwrap();

        let writes = h.chapters.written();
        assert_eq!(writes[0].1[0].title, "Blue by A");
        assert_eq!(writes[0].1[1].title, "Chapter 2");
    }

    #[test]
    fn no_match_on_one_chapter_keeps_its_title() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let mut h = Harness::new(&media);
        h.recognizer = FakeRecognizer::default()
            .with_song(0, song("Blue", &["A"]))
            .with_song(120, song("Green", &["D"]));

        let result = h
            .orchestrator()
            .process_file(&FileContext::new(&media, Config::default()))
            .unwrap();

        assert_eq!(result.counts.recognized, 2);
        assert_eq!(result.counts.unrecognized, 1);
        assert_eq!(
            result.outcomes[1].kind,
            OutcomeKind::Unrecognized { reason: None }
        );

        let titles: Vec<String> = h.chapters.written()[0]
            .1
            .iter()
            .map(|c| c.title.clone())
            .collect();
        assert_eq!(titles, vec!["Blue - A", "Chapter 2", "Green - D"]);
    }

    #[test]
    fn sample_failure_and_service_error_are_per_chapter() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let mut h = Harness::new(&media);
        h.sampler.fail_at_secs = vec![0];
        h.recognizer = FakeRecognizer {
            errors: vec![60],
            ..FakeRecognizer::default()
        }
        .with_song(120, song("Green", &["D"]));

        let result = h
            .orchestrator()
            .process_file(&FileContext::new(&media, Config::default()))
            .unwrap();

        assert_eq!(result.counts.extraction_failed, 1);
        assert_eq!(result.counts.unrecognized, 1);
        assert_eq!(result.counts.recognized, 1);
        assert!(matches!(
            result.outcomes[1].kind,
            OutcomeKind::Unrecognized { reason: Some(ref r) } if r.contains("rate limited")
        ));
        // Single attempt per chapter, none for the failed sample.
        assert_eq!(*h.recognizer.calls.lock().unwrap(), 2);
    }

    #[test]
    fn nothing_recognized_writes_nothing() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let h = Harness::new(&media);

        let result = h
            .orchestrator()
            .process_file(&FileContext::new(&media, Config::default()))
            .unwrap();

        assert_eq!(result.verdict, Verdict::Success);
        assert_eq!(result.counts.unrecognized, 3);
        assert!(result.written_to.is_none());
        assert!(h.chapters.written().is_empty());
        // Backup is still written before recognition starts.
        assert!(backup_path_for(&media).exists());
    }

    #[test]
    fn no_chapters_is_skipped() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("empty.mkv");
        let h = Harness {
            chapters: FakeChapters::default(),
            sampler: FakeSampler::default(),
            recognizer: FakeRecognizer::default(),
        };

        let result = h
            .orchestrator()
            .process_file(&FileContext::new(&media, Config::default()))
            .unwrap();
        assert_eq!(result.verdict, Verdict::Skipped(SkipReason::NoChapters));
        assert!(!backup_path_for(&media).exists());
    }

    #[test]
    fn no_backup_option_skips_snapshot() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let mut h = Harness::new(&media);
        h.recognizer = FakeRecognizer::default().with_song(0, song("Blue", &["A"]));

        let mut config = Config::default();
        config.options.no_backup = true;
        let result = h
            .orchestrator()
            .process_file(&FileContext::new(&media, config))
            .unwrap();

        assert!(result.backup_path.is_none());
        assert!(!backup_path_for(&media).exists());
        assert_eq!(h.chapters.written().len(), 1);
    }

    #[test]
    fn existing_backup_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let original = vec![Chapter::new("1", 0, "Pristine")];
        BackupManager::new().snapshot(&original, &media).unwrap();

        let h = Harness::new(&media);
        h.orchestrator()
            .process_file(&FileContext::new(&media, Config::default()))
            .unwrap();

        assert_eq!(
            BackupManager::new().restore(&media, None).unwrap(),
            original
        );
    }

    #[test]
    fn preflight_failure_aborts_before_reading() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let mut h = Harness::new(&media);
        h.chapters.unavailable = true;

        let err = h
            .orchestrator()
            .process_file(&FileContext::new(&media, Config::default()))
            .unwrap_err();
        assert!(matches!(err, FileError::ToolUnavailable { .. }));
        assert!(h.sampler.windows.lock().unwrap().is_empty());

        let mut config = Config::default();
        config.options.skip_check = true;
        assert!(h
            .orchestrator()
            .process_file(&FileContext::new(&media, config))
            .is_ok());
    }

    #[test]
    fn read_failure_is_file_error() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let mut h = Harness::new(&media);
        h.chapters.fail_reads = true;

        let err = h
            .orchestrator()
            .process_file(&FileContext::new(&media, Config::default()))
            .unwrap_err();
        assert!(matches!(err, FileError::ChapterRead { .. }));
        assert!(err.to_string().contains("live.mkv"));
    }

    #[test]
    fn write_failure_points_at_backup() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let mut h = Harness::new(&media);
        h.chapters.fail_writes = true;
        h.recognizer = FakeRecognizer::default().with_song(0, song("Blue", &["A"]));

        let err = h
            .orchestrator()
            .process_file(&FileContext::new(&media, Config::default()))
            .unwrap_err();
        assert!(matches!(err, FileError::ChapterWrite { .. }));
        assert!(err.to_string().contains("chapters.backup.json"));
    }

    #[test]
    fn output_copy_leaves_source_untouched() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let output = dir.path().join("renamed.mkv");
        std::fs::write(&media, b"matroska").unwrap();

        let mut h = Harness::new(&media);
        h.recognizer = FakeRecognizer::default().with_song(60, song("Red", &["B"]));

        let ctx = FileContext::new(&media, Config::default()).with_output(Some(output.clone()));
        let result = h.orchestrator().process_file(&ctx).unwrap();

        assert_eq!(result.written_to, Some(output.clone()));
        assert_eq!(std::fs::read(&output).unwrap(), b"matroska");
        let writes = h.chapters.written();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, output);
    }

    #[test]
    fn cancellation_stops_before_writing() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let mut h = Harness::new(&media);
        h.recognizer = FakeRecognizer::default().with_song(0, song("Blue", &["A"]));

        let cancel = CancelHandle::new();
        let trigger = cancel.clone();
        let ctx = FileContext::new(&media, Config::default())
            .with_cancel_handle(cancel)
            .with_progress_callback(Box::new(move |_, n, _| {
                if n == 2 {
                    trigger.cancel();
                }
            }));

        let err = h.orchestrator().process_file(&ctx).unwrap_err();
        assert!(err.is_cancelled());
        assert!(h.chapters.written().is_empty());
    }

    #[test]
    fn restore_writes_backup_chapters() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let h = Harness::new(&media);
        BackupManager::new()
            .snapshot(&three_chapters(), &media)
            .unwrap();

        let result = h
            .orchestrator()
            .restore_file(&FileContext::new(&media, Config::default()), None)
            .unwrap();

        assert_eq!(result.verdict, Verdict::Restored);
        assert_eq!(h.chapters.written(), vec![(media.clone(), three_chapters())]);
        // Backups survive a restore.
        assert!(backup_path_for(&media).exists());
    }

    #[test]
    fn restore_without_backup_fails() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let h = Harness::new(&media);

        let err = h
            .orchestrator()
            .restore_file(
                &FileContext::new(&media, Config::default()),
                Some(Path::new("/nonexistent/backup.json")),
            )
            .unwrap_err();
        assert!(matches!(err, FileError::Backup { .. }));
        assert!(h.chapters.written().is_empty());
    }

    #[test]
    fn store_chapters_all_reach_terminal_state() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("live.mkv");
        let mut h = Harness::new(&media);
        h.sampler.fail_at_secs = vec![60];
        h.recognizer = FakeRecognizer::default().with_song(0, song("Blue", &["A"]));

        let mut store = ChapterStore::new(&media, three_chapters());
        let seen = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&seen);
        let ctx = FileContext::new(&media, Config::default())
            .with_progress_callback(Box::new(move |_, _, _| *counter.lock().unwrap() += 1));

        h.orchestrator().recognize_chapters(&ctx, &mut store).unwrap();

        assert!(store.all_terminal());
        assert_eq!(store.state(0), Some(ChapterState::Recognized));
        assert_eq!(store.state(1), Some(ChapterState::SampleFailed));
        assert_eq!(store.state(2), Some(ChapterState::Unrecognized));
        assert!(!store.is_persisted());
        assert_eq!(*seen.lock().unwrap(), 3);
    }

    #[test]
    fn every_chapter_settles_with_open_ended_chapters() {
        let media = Path::new("/media/live.mkv");
        let sampler = FakeSampler {
            fail_at_secs: vec![90],
            ..FakeSampler::default()
        };
        let orchestrator = RecognitionOrchestrator::new(
            Box::new(FakeChapters::default()),
            Box::new(sampler),
            Box::new(FakeRecognizer::default().with_song(0, song("Blue", &["A"]))),
        );
        let mut store = ChapterStore::new(
            media,
            vec![
                Chapter::new("1", 0, "Chapter 1"),
                Chapter::new("2", secs(30), "Chapter 2"),
                Chapter::new("3", secs(90), "Chapter 3"),
            ],
        );

        let result = orchestrator
            .recognize_chapters(&FileContext::new(media, Config::default()), &mut store)
            .unwrap();

        assert!(store.all_terminal());
        assert_eq!(result.outcomes.len(), 3);
        let indices: Vec<usize> = result.outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(store.state(0), Some(ChapterState::Recognized));
        assert_eq!(store.state(1), Some(ChapterState::Unrecognized));
        assert_eq!(store.state(2), Some(ChapterState::SampleFailed));
    }
}
