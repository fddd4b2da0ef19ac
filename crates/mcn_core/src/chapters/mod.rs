//! Chapter handling module.
//!
//! This module covers the chapter side of the pipeline: the chapter model,
//! Matroska chapter XML, the per-file [`ChapterStore`], and the
//! [`ChapterSource`] seam through which chapters are read from and written
//! to a container.
//!
//! # Usage
//!
//! ```ignore
//! use mcn_core::chapters::{ChapterSource, ChapterStore, MkvToolnix};
//!
//! let source = MkvToolnix::new("mkvextract", "mkvpropedit");
//! let chapters = source.read_chapters(Path::new("/media/live.mkv"))?;
//! let mut store = ChapterStore::new("/media/live.mkv", chapters);
//! store.rename(0, "Song - Artist");
//! source.write_chapters(store.media_path(), store.chapters())?;
//! ```

mod mkvtoolnix;
mod parser;
mod store;
mod types;

use std::path::Path;

use crate::tools::ToolError;

pub use mkvtoolnix::MkvToolnix;
pub use parser::{parse_chapter_xml, serialize_chapter_xml};
pub use store::{ChapterState, ChapterStore};
pub use types::{
    format_timestamp_ns, parse_timestamp_ns, secs_to_ns, Chapter, ChapterError, ChapterResult,
    ChapterSpan, FALLBACK_CHAPTER_LENGTH_NS, NS_PER_SEC,
};

/// Reads and writes the chapter list of a media container.
pub trait ChapterSource: Send + Sync {
    /// Ordered chapters of `media_path`; empty when the file has none.
    fn read_chapters(&self, media_path: &Path) -> Result<Vec<Chapter>, ChapterError>;

    /// Replace the chapters of `media_path` with `chapters`.
    fn write_chapters(&self, media_path: &Path, chapters: &[Chapter]) -> Result<(), ChapterError>;

    /// Cheap check that the backing tools can be found.
    fn check_available(&self) -> Result<(), ToolError> {
        Ok(())
    }
}
