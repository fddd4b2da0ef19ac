//! FFmpeg audio sample extraction.
//!
//! Cuts a short mono window out of the media file and returns it as raw
//! 32-bit float PCM at the recognizer's sample rate.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::chapters::NS_PER_SEC;
use crate::recognition::AudioSample;
use crate::tools::{ensure_resolvable, ToolError, FFMPEG};

use super::planner::SamplingWindow;
use super::{AudioSampler, SampleError};

/// Sample rate expected by the fingerprinting helper.
pub const RECOGNITION_SAMPLE_RATE: u32 = 8000;

/// Bytes per f32 sample.
const BYTES_PER_SAMPLE: usize = 4;

fn format_secs(ns: u64) -> String {
    format!("{:.3}", ns as f64 / NS_PER_SEC as f64)
}

/// Minimum byte count for a complete sample of `duration_ns`.
pub fn expected_bytes(sample_rate: u32, duration_ns: u64) -> usize {
    let frames = (sample_rate as u128 * duration_ns as u128) / NS_PER_SEC as u128;
    frames as usize * BYTES_PER_SAMPLE
}

/// [`AudioSampler`] backed by the `ffmpeg` program.
#[derive(Debug, Clone)]
pub struct FfmpegSampler {
    program: PathBuf,
    sample_rate: u32,
}

impl FfmpegSampler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            sample_rate: RECOGNITION_SAMPLE_RATE,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    fn build_command(&self, media_path: &Path, window: &SamplingWindow) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-ss")
            .arg(format_secs(window.start_ns()))
            .arg("-i")
            .arg(media_path)
            .arg("-vn")
            .arg("-t")
            .arg(format_secs(window.duration_ns))
            .arg("-acodec")
            .arg("pcm_f32le")
            .arg("-f")
            .arg("f32le")
            .arg("-ar")
            .arg(self.sample_rate.to_string())
            .arg("-ac")
            .arg("1")
            .arg("-");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl AudioSampler for FfmpegSampler {
    fn extract_sample(
        &self,
        media_path: &Path,
        window: &SamplingWindow,
    ) -> Result<AudioSample, SampleError> {
        if window.is_empty() {
            return Err(SampleError::EmptyWindow);
        }

        tracing::debug!(
            "Extracting sample {}s ~ {}s from {}",
            format_secs(window.start_ns()),
            format_secs(window.end_ns()),
            media_path.display()
        );

        let output = self
            .build_command(media_path, window)
            .output()
            .map_err(|e| SampleError::Ffmpeg(format!("Failed to run FFmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr.lines().last().unwrap_or_default().trim().to_string();
            return Err(SampleError::Ffmpeg(format!(
                "FFmpeg exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                last_line
            )));
        }

        let mut buffer = output.stdout;
        let expected = expected_bytes(self.sample_rate, window.duration_ns);
        if buffer.len() < expected {
            return Err(SampleError::Insufficient {
                got: buffer.len(),
                expected,
            });
        }
        buffer.truncate(expected);

        Ok(AudioSample::new(buffer, self.sample_rate, window.duration_ns))
    }

    fn check_available(&self) -> Result<(), ToolError> {
        ensure_resolvable(FFMPEG, &self.program).map(|_| ())
    }
}
