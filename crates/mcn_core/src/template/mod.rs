//! Chapter title templates.
//!
//! A template is a format string with `{variable}` placeholders filled from
//! a recognized [`SongInfo`](crate::recognition::SongInfo). Nine presets
//! cover the common layouts; anything containing `{` is taken verbatim.

mod engine;
mod presets;

use thiserror::Error;

pub use engine::{render, substitute, TemplateSpec};
pub use presets::{example_song, find_preset, Preset, DEFAULT_PRESET, PRESETS, VARIABLES};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unknown template preset '{0}'")]
    UnknownPreset(String),
}
