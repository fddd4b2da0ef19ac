//! Resolved, immutable run configuration.
//!
//! Produced once by the resolver and then only read. Every field has a
//! concrete value; optional paths stay `None` when nobody set them.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::template::TemplateSpec;

use super::ConfigError;

/// Where inside a chapter the audio sample is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingStrategy {
    /// Fixed offset after the chapter start.
    #[default]
    Start,
    /// Centered on the chapter midpoint.
    Middle,
    /// Ending at the chapter end.
    End,
    /// At a fraction of the chapter length.
    Custom,
}

impl SamplingStrategy {
    pub const ALL: [SamplingStrategy; 4] = [
        SamplingStrategy::Start,
        SamplingStrategy::Middle,
        SamplingStrategy::End,
        SamplingStrategy::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingStrategy::Start => "start",
            SamplingStrategy::Middle => "middle",
            SamplingStrategy::End => "end",
            SamplingStrategy::Custom => "custom",
        }
    }
}

impl fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplingStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownStrategy(s.to_string()))
    }
}

/// Sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionSettings {
    pub strategy: SamplingStrategy,
    /// Seconds after the chapter start (`start` strategy).
    pub offset: f64,
    /// Fraction of the chapter length in `[0, 1]` (`custom` strategy).
    pub percentage: f64,
    /// Sample length in seconds.
    pub duration: f64,
}

pub const DEFAULT_OFFSET_SECS: f64 = 5.0;
pub const DEFAULT_PERCENTAGE: f64 = 0.5;
pub const DEFAULT_DURATION_SECS: f64 = 3.0;

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            strategy: SamplingStrategy::Start,
            offset: DEFAULT_OFFSET_SECS,
            percentage: DEFAULT_PERCENTAGE,
            duration: DEFAULT_DURATION_SECS,
        }
    }
}

/// Explicit paths to external tools. `None` means auto-detect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolPaths {
    pub ffmpeg: Option<PathBuf>,
    pub mkvextract: Option<PathBuf>,
    pub mkvpropedit: Option<PathBuf>,
    pub recognizer: Option<PathBuf>,
}

/// Behavioural switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunOptions {
    /// Do not write a chapter backup before renaming.
    pub no_backup: bool,
    /// Skip the tool availability preflight.
    pub skip_check: bool,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    pub mkv_file: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub template: TemplateSpec,
    pub recognition: RecognitionSettings,
    pub tools: ToolPaths,
    pub options: RunOptions,
}
