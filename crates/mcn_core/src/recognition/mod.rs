//! Song recognition.
//!
//! Fingerprinting and catalogue lookup are opaque to the pipeline: an
//! [`AudioSample`] goes in, a [`Recognition`] comes out.

mod command;
mod types;

use crate::tools::ToolError;

pub use command::{parse_reply, CommandRecognizer};
pub use types::{AudioSample, Recognition, RecognitionError, SongInfo};

/// Identifies the song playing in an audio sample.
pub trait RecognitionService: Send + Sync {
    /// Look up `sample`. A single attempt; callers do not retry.
    fn recognize(&self, sample: &AudioSample) -> Result<Recognition, RecognitionError>;

    /// Cheap check that the backing service can be reached.
    fn check_available(&self) -> Result<(), ToolError> {
        Ok(())
    }
}
