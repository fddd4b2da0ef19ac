//! Built-in title templates and variable descriptions.

use crate::recognition::SongInfo;

/// A named, built-in title template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub format: &'static str,
}

/// Preset used when nothing else is configured.
pub const DEFAULT_PRESET: &str = "default";

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "default",
        format: "{name} - {artists}",
    },
    Preset {
        name: "with_trans",
        format: "{name}（{trans_name}）- {artists}",
    },
    Preset {
        name: "full",
        format: "{name} - {artists} [{album}]",
    },
    Preset {
        name: "simple",
        format: "{name}",
    },
    Preset {
        name: "artist_first",
        format: "{artists} - {name}",
    },
    Preset {
        name: "with_id",
        format: "{name} - {artists} (ID: {id})",
    },
    Preset {
        name: "detailed",
        format: "{name}（{trans_name}）- {artists} | {album}",
    },
    Preset {
        name: "japanese",
        format: "{name} / {artists}",
    },
    Preset {
        name: "minimal",
        format: "{name} - {artist_first}",
    },
];

/// Look up a preset by name.
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

/// Template variables with a short description each.
pub const VARIABLES: &[(&str, &str)] = &[
    ("name", "song title"),
    ("trans_name", "translated title"),
    ("artists", "all artists, comma separated"),
    ("artist_first", "first artist"),
    ("album", "album name"),
    ("id", "song id"),
    ("popularity", "popularity score"),
];

/// Song used to illustrate templates in listings.
pub fn example_song() -> SongInfo {
    SongInfo {
        name: "ハジメテノオト".to_string(),
        trans_name: Some("初次之音".to_string()),
        artists: vec!["初音ミク".to_string(), "malo".to_string()],
        album: Some("VOCALOID".to_string()),
        id: "12345678".to_string(),
        popularity: Some(95.0),
    }
}
