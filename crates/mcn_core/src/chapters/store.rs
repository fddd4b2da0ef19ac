//! In-memory chapter list for one media file.
//!
//! Tracks where every chapter is in the recognition lifecycle so the
//! orchestrator can tell when the whole file has settled and is safe
//! to persist.

use std::path::{Path, PathBuf};

use super::types::{Chapter, ChapterSpan, FALLBACK_CHAPTER_LENGTH_NS};

/// Lifecycle state of a single chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterState {
    /// Loaded, nothing attempted yet.
    Pending,
    /// A sample window was planned and handed to the sampler.
    Sampled,
    /// Song found and title rewritten.
    Recognized,
    /// Recognition returned no match (or failed); title untouched.
    Unrecognized,
    /// Audio sample could not be extracted; title untouched.
    SampleFailed,
}

impl ChapterState {
    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChapterState::Recognized | ChapterState::Unrecognized | ChapterState::SampleFailed
        )
    }
}

/// Ordered chapters of one media file plus their processing state.
#[derive(Debug, Clone)]
pub struct ChapterStore {
    media_path: PathBuf,
    chapters: Vec<Chapter>,
    states: Vec<ChapterState>,
    persisted: bool,
}

impl ChapterStore {
    /// Create a store for chapters freshly loaded from `media_path`.
    pub fn new(media_path: impl Into<PathBuf>, chapters: Vec<Chapter>) -> Self {
        let states = vec![ChapterState::Pending; chapters.len()];
        Self {
            media_path: media_path.into(),
            chapters,
            states,
            persisted: false,
        }
    }

    pub fn media_path(&self) -> &Path {
        &self.media_path
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn get(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn state(&self, index: usize) -> Option<ChapterState> {
        self.states.get(index).copied()
    }

    /// Resolved interval of the chapter at `index`.
    ///
    /// Uses the stored end time, else the next chapter's start, else
    /// assumes a fixed chapter length.
    pub fn span(&self, index: usize) -> Option<ChapterSpan> {
        let chapter = self.chapters.get(index)?;
        let end_ns = chapter
            .end_ns
            .or_else(|| self.chapters.get(index + 1).map(|next| next.start_ns))
            .unwrap_or_else(|| chapter.start_ns.saturating_add(FALLBACK_CHAPTER_LENGTH_NS));
        Some(ChapterSpan::new(chapter.start_ns, end_ns))
    }

    /// Resolved span of every chapter, in order.
    pub fn spans(&self) -> Vec<ChapterSpan> {
        (0..self.chapters.len()).filter_map(|i| self.span(i)).collect()
    }

    /// Record a state transition. Terminal states are never left.
    pub fn mark(&mut self, index: usize, state: ChapterState) {
        if let Some(slot) = self.states.get_mut(index) {
            if !slot.is_terminal() {
                *slot = state;
            }
        }
    }

    /// Rewrite a chapter's title and mark it recognized.
    pub fn rename(&mut self, index: usize, title: impl Into<String>) {
        if let Some(chapter) = self.chapters.get_mut(index) {
            chapter.title = title.into();
            self.mark(index, ChapterState::Recognized);
        }
    }

    /// Whether every chapter reached a terminal state.
    pub fn all_terminal(&self) -> bool {
        self.states.iter().all(ChapterState::is_terminal)
    }

    /// Number of chapters whose title was rewritten.
    pub fn renamed_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| **s == ChapterState::Recognized)
            .count()
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    /// Consume the store and return the (possibly renamed) chapters.
    pub fn into_chapters(self) -> Vec<Chapter> {
        self.chapters
    }
}
