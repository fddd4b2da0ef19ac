//! Sample window planning.

use crate::chapters::{secs_to_ns, ChapterSpan};
use crate::config::{RecognitionSettings, SamplingStrategy};

/// Where to cut the audio sample for one chapter.
///
/// `offset_ns` is relative to the chapter start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingWindow {
    pub chapter_start_ns: u64,
    pub offset_ns: u64,
    pub duration_ns: u64,
}

impl SamplingWindow {
    /// Absolute start of the sample.
    pub fn start_ns(&self) -> u64 {
        self.chapter_start_ns + self.offset_ns
    }

    /// Absolute end of the sample.
    pub fn end_ns(&self) -> u64 {
        self.start_ns() + self.duration_ns
    }

    pub fn is_empty(&self) -> bool {
        self.duration_ns == 0
    }
}

/// Plan the sample window for a chapter.
///
/// The window is always inside `span`: a duration longer than the chapter
/// shrinks to the chapter length, and the start is clamped so the window
/// ends no later than the chapter does.
pub fn plan(span: ChapterSpan, settings: &RecognitionSettings) -> SamplingWindow {
    let length = span.length_ns();
    let duration = secs_to_ns(settings.duration).min(length);

    let raw_start = match settings.strategy {
        SamplingStrategy::Start => span.start_ns.saturating_add(secs_to_ns(settings.offset)),
        SamplingStrategy::Middle => span.midpoint_ns().saturating_sub(duration / 2),
        SamplingStrategy::End => span.start_ns + (length - duration),
        SamplingStrategy::Custom => {
            let fraction = settings.percentage.clamp(0.0, 1.0);
            span.start_ns + (length as f64 * fraction).round() as u64
        }
    };

    let latest = span.start_ns + (length - duration);
    let start = raw_start.clamp(span.start_ns, latest);

    SamplingWindow {
        chapter_start_ns: span.start_ns,
        offset_ns: start - span.start_ns,
        duration_ns: duration,
    }
}
