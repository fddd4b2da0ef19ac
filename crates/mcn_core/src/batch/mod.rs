//! Batch processing of many media files.
//!
//! Files are processed strictly one after another. Files that already
//! have a chapter backup are treated as done and skipped unless forced.

mod controller;
mod discovery;

pub use controller::{BatchController, BatchSummary, RunMode};
pub use discovery::{discover_media_files, MEDIA_EXTENSION};
