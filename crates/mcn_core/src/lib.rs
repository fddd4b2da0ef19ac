//! MCN Core - chapter recognition and renaming for MKV files
//!
//! Samples audio from each chapter, identifies the song with an external
//! recognition service, and rewrites the chapter titles from a template.
//! Original chapters are backed up first so they can be restored.
//!
//! This crate has no CLI dependencies; the `mcn_cli` binary drives it.

pub mod backup;
pub mod batch;
pub mod chapters;
pub mod config;
mod fs_util;
pub mod logging;
pub mod orchestrator;
pub mod recognition;
pub mod sampling;
pub mod template;
pub mod tools;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
