//! Chapter types and error definitions.
//!
//! Provides types for representing Matroska chapter data and
//! errors that can occur during chapter operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Nanoseconds per second.
pub const NS_PER_SEC: u64 = 1_000_000_000;

/// Length assumed for a chapter that has no end time and no successor.
pub const FALLBACK_CHAPTER_LENGTH_NS: u64 = 180 * NS_PER_SEC;

/// A single chapter of a media container.
///
/// `uid` identifies the chapter for its whole lifetime; `title` is the only
/// field the pipeline mutates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Matroska ChapterUID as written in the container (may be empty).
    pub uid: String,
    /// Chapter start time in nanoseconds.
    pub start_ns: u64,
    /// Chapter end time in nanoseconds, if the container stores one.
    pub end_ns: Option<u64>,
    /// Display title.
    pub title: String,
}

impl Chapter {
    /// Create a new chapter without an end time.
    pub fn new(uid: impl Into<String>, start_ns: u64, title: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            start_ns,
            end_ns: None,
            title: title.into(),
        }
    }

    /// Set the end time.
    pub fn with_end(mut self, end_ns: u64) -> Self {
        self.end_ns = Some(end_ns);
        self
    }

    /// Get the start time in seconds.
    pub fn start_secs(&self) -> f64 {
        self.start_ns as f64 / NS_PER_SEC as f64
    }

    /// Format start time as HH:MM:SS.nnnnnnnnn.
    pub fn format_start_time(&self) -> String {
        format_timestamp_ns(self.start_ns)
    }

    /// Format end time as HH:MM:SS.nnnnnnnnn.
    pub fn format_end_time(&self) -> Option<String> {
        self.end_ns.map(format_timestamp_ns)
    }
}

/// Resolved time interval of a chapter, used for sample planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterSpan {
    pub start_ns: u64,
    pub end_ns: u64,
}

impl ChapterSpan {
    pub fn new(start_ns: u64, end_ns: u64) -> Self {
        Self { start_ns, end_ns }
    }

    /// Length of the span; zero for malformed spans (end before start).
    pub fn length_ns(&self) -> u64 {
        self.end_ns.saturating_sub(self.start_ns)
    }

    /// Midpoint of the span.
    pub fn midpoint_ns(&self) -> u64 {
        self.start_ns + self.length_ns() / 2
    }
}

/// Error types for chapter operations.
#[derive(Debug, thiserror::Error)]
pub enum ChapterError {
    /// Reading chapters from the container failed.
    #[error("Failed to read chapters from {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    /// Writing chapters into the container failed.
    #[error("Failed to write chapters to {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    /// Chapter XML is malformed.
    #[error("Malformed chapter XML: {0}")]
    MalformedXml(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Command execution failed.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },
}

impl ChapterError {
    pub fn read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Read {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Write {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Type alias for chapter operation results.
pub type ChapterResult<T> = Result<T, ChapterError>;

/// Format a nanosecond timestamp as HH:MM:SS.nnnnnnnnn.
pub fn format_timestamp_ns(ns: u64) -> String {
    let total_secs = ns / NS_PER_SEC;
    let remaining_ns = ns % NS_PER_SEC;

    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    format!(
        "{:02}:{:02}:{:02}.{:09}",
        hours, minutes, seconds, remaining_ns
    )
}

/// Parse a timestamp string (HH:MM:SS[.fraction]) to nanoseconds.
///
/// The fraction may have any precision up to nanoseconds; extra digits
/// are truncated. Out-of-range minutes or seconds and values that do not
/// fit in `u64` nanoseconds yield `None`.
pub fn parse_timestamp_ns(time_str: &str) -> Option<u64> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: u64 = parts[0].parse().ok()?;
    let minutes: u64 = parts[1].parse().ok()?;

    let (secs_str, frac_str) = match parts[2].split_once('.') {
        Some((s, f)) => (s, f),
        None => (parts[2], ""),
    };
    let seconds: u64 = secs_str.parse().ok()?;

    let nanos: u64 = if frac_str.is_empty() {
        0
    } else {
        if !frac_str.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        // Pad or truncate to 9 digits
        let digits: String = frac_str.chars().take(9).collect();
        format!("{:0<9}", digits).parse().ok()?
    };

    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)?
        .checked_mul(NS_PER_SEC)?
        .checked_add(nanos)
}

/// Convert fractional seconds to nanoseconds, saturating at zero.
pub fn secs_to_ns(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * NS_PER_SEC as f64).round() as u64
    } else {
        0
    }
}
