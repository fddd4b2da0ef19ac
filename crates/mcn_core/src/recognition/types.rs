//! Recognition types and errors.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Metadata about a recognized song.
///
/// Optional fields render as empty strings in titles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongInfo {
    /// Song title.
    #[serde(default)]
    pub name: String,

    /// Translated title.
    #[serde(default, alias = "transName", skip_serializing_if = "Option::is_none")]
    pub trans_name: Option<String>,

    /// Performing artists, in credit order.
    #[serde(default, deserialize_with = "deserialize_artists")]
    pub artists: Vec<String>,

    /// Album name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    /// Identifier in the recognition service's catalogue.
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,

    /// Popularity score reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
}

impl SongInfo {
    pub fn new(name: impl Into<String>, artists: Vec<String>) -> Self {
        Self {
            name: name.into(),
            artists,
            ..Default::default()
        }
    }

    /// All artists joined with ", ".
    pub fn artists_joined(&self) -> String {
        self.artists.join(", ")
    }

    /// First credited artist, or empty.
    pub fn artist_first(&self) -> &str {
        self.artists.first().map(String::as_str).unwrap_or("")
    }

    /// Popularity without a trailing ".0" for whole numbers.
    pub fn popularity_display(&self) -> String {
        match self.popularity {
            Some(p) if p.fract() == 0.0 => format!("{}", p as i64),
            Some(p) => format!("{}", p),
            None => String::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtistEntry {
    Name(String),
    Object { name: String },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtistsField {
    Joined(String),
    List(Vec<ArtistEntry>),
}

/// Accept `"A, B"`, `["A", "B"]` or `[{"name": "A"}, ..]`.
fn deserialize_artists<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<ArtistsField>::deserialize(deserializer)?;
    Ok(match field {
        None => Vec::new(),
        Some(ArtistsField::Joined(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect(),
        Some(ArtistsField::List(entries)) => entries
            .into_iter()
            .map(|e| match e {
                ArtistEntry::Name(n) | ArtistEntry::Object { name: n } => n,
            })
            .collect(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdField {
    Number(i64),
    Text(String),
}

/// Song ids come back as numbers or strings depending on the service.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<IdField>::deserialize(deserializer)? {
        Some(IdField::Number(n)) => n.to_string(),
        Some(IdField::Text(s)) => s,
        None => String::new(),
    })
}

/// Raw audio handed to the recognition service.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSample {
    /// Mono 32-bit float little-endian PCM.
    pub pcm: Vec<u8>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Requested sample length in nanoseconds.
    pub duration_ns: u64,
}

impl AudioSample {
    pub fn new(pcm: Vec<u8>, sample_rate: u32, duration_ns: u64) -> Self {
        Self {
            pcm,
            sample_rate,
            duration_ns,
        }
    }

    /// Number of f32 frames contained.
    pub fn frame_count(&self) -> usize {
        self.pcm.len() / 4
    }
}

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    Match(SongInfo),
    NoMatch,
}

/// Errors from the recognition service itself.
///
/// These never abort a file; the chapter is recorded as unrecognized.
#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Failed to run recognizer: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Recognizer exited with code {exit_code}: {message}")]
    ProcessFailed { exit_code: i32, message: String },

    #[error("Invalid recognizer response: {0}")]
    InvalidResponse(String),

    #[error("Recognition service error: {0}")]
    Service(String),
}
