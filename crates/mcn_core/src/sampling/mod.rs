//! Audio sampling: where to listen inside a chapter and how to cut it out.

mod ffmpeg;
mod planner;

use std::path::Path;

use thiserror::Error;

use crate::recognition::AudioSample;
use crate::tools::ToolError;

pub use ffmpeg::{expected_bytes, FfmpegSampler, RECOGNITION_SAMPLE_RATE};
pub use planner::{plan, SamplingWindow};

/// Sample extraction failures. Fatal for the chapter only.
#[derive(Error, Debug)]
pub enum SampleError {
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("Insufficient audio data: {got} < {expected} bytes")]
    Insufficient { got: usize, expected: usize },

    #[error("Sample window is empty")]
    EmptyWindow,
}

/// Extracts raw audio for a window of a media file.
pub trait AudioSampler: Send + Sync {
    fn extract_sample(
        &self,
        media_path: &Path,
        window: &SamplingWindow,
    ) -> Result<AudioSample, SampleError>;

    /// Cheap check that the backing tool can be found.
    fn check_available(&self) -> Result<(), ToolError> {
        Ok(())
    }
}
