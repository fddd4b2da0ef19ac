//! Title rendering.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::recognition::SongInfo;

use super::presets::{find_preset, Preset};
use super::TemplateError;

/// Which template renders chapter titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSpec {
    /// One of the built-in presets.
    Preset(&'static Preset),
    /// A literal format string.
    Custom(String),
}

impl TemplateSpec {
    /// Interpret a configured template value.
    ///
    /// Values containing `{` are format strings; anything else must name
    /// a preset.
    pub fn parse(value: &str) -> Result<Self, TemplateError> {
        if value.contains('{') {
            return Ok(TemplateSpec::Custom(value.to_string()));
        }
        find_preset(value.trim())
            .map(TemplateSpec::Preset)
            .ok_or_else(|| TemplateError::UnknownPreset(value.to_string()))
    }

    /// The format string this spec renders with.
    pub fn format_str(&self) -> &str {
        match self {
            TemplateSpec::Preset(preset) => preset.format,
            TemplateSpec::Custom(format) => format,
        }
    }

    /// Preset name, or `"custom"`.
    pub fn label(&self) -> &str {
        match self {
            TemplateSpec::Preset(preset) => preset.name,
            TemplateSpec::Custom(_) => "custom",
        }
    }
}

impl Default for TemplateSpec {
    fn default() -> Self {
        TemplateSpec::Preset(&super::presets::PRESETS[0])
    }
}

impl Serialize for TemplateSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TemplateSpec::Preset(preset) => serializer.serialize_str(preset.name),
            TemplateSpec::Custom(format) => serializer.serialize_str(format),
        }
    }
}

static EMPTY_BRACKETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:[（(]\s*[）)]|\[\s*\])\s*").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TRAILING_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\s*[-|/])+\s*$").unwrap());

fn variable(song: &SongInfo, name: &str) -> String {
    match name {
        "name" => song.name.clone(),
        "trans_name" => song.trans_name.clone().unwrap_or_default(),
        "artists" => song.artists_joined(),
        "artist_first" => song.artist_first().to_string(),
        "album" => song.album.clone().unwrap_or_default(),
        "id" => song.id.clone(),
        "popularity" => song.popularity_display(),
        _ => String::new(),
    }
}

/// Substitute `{variable}` placeholders. `{{` and `}}` are literal braces.
///
/// Unknown variables expand to nothing; an unterminated `{` is kept as is.
pub fn substitute(format: &str, song: &SongInfo) -> String {
    let mut out = String::with_capacity(format.len() + 32);
    let mut rest = format;

    while let Some(pos) = rest.find(&['{', '}'][..]) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('{') {
            match tail.find('}') {
                Some(close) => {
                    out.push_str(&variable(song, tail[1..close].trim()));
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        } else {
            out.push('}');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Clean up what missing fields leave behind.
fn tidy(rendered: &str) -> String {
    let s = EMPTY_BRACKETS.replace_all(rendered, " ");
    let s = WHITESPACE.replace_all(&s, " ");
    let s = TRAILING_SEPARATOR.replace(s.trim(), "");
    s.trim().to_string()
}

/// Render a chapter title for `song`.
pub fn render(spec: &TemplateSpec, song: &SongInfo) -> String {
    tidy(&substitute(spec.format_str(), song))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song() -> SongInfo {
        SongInfo {
            name: "Blue".to_string(),
            artists: vec!["A".to_string(), "B".to_string()],
            ..Default::default()
        }
    }

    fn custom(format: &str) -> TemplateSpec {
        TemplateSpec::parse(format).unwrap()
    }

    #[test]
    fn default_preset_joins_artists() {
        assert_eq!(render(&TemplateSpec::default(), &song()), "Blue - A, B");
    }

    #[test]
    fn artist_first_custom_template() {
        assert_eq!(render(&custom("{name} by {artist_first}"), &song()), "Blue by A");
    }

    #[test]
    fn missing_trans_name_drops_brackets() {
        let spec = TemplateSpec::parse("with_trans").unwrap();
        assert_eq!(render(&spec, &song()), "Blue - A, B");

        let mut translated = song();
        translated.trans_name = Some("青".to_string());
        assert_eq!(render(&spec, &translated), "Blue（青）- A, B");
    }

    #[test]
    fn missing_album_leaves_no_trailing_separator() {
        assert_eq!(
            render(&TemplateSpec::parse("full").unwrap(), &song()),
            "Blue - A, B"
        );
        assert_eq!(
            render(&TemplateSpec::parse("detailed").unwrap(), &song()),
            "Blue - A, B"
        );
    }

    #[test]
    fn unknown_variable_is_empty() {
        assert_eq!(render(&custom("{name} {bogus}"), &song()), "Blue");
    }

    #[test]
    fn escaped_braces_are_literal() {
        assert_eq!(render(&custom("{{{name}}}"), &song()), "{Blue}");
    }

    #[test]
    fn unterminated_brace_is_kept() {
        assert_eq!(substitute("{name} {oops", &song()), "Blue {oops");
    }

    #[test]
    fn rendering_is_deterministic() {
        let spec = TemplateSpec::parse("with_id").unwrap();
        let mut s = song();
        s.id = "42".to_string();
        let first = render(&spec, &s);
        assert_eq!(first, "Blue - A, B (ID: 42)");
        assert_eq!(render(&spec, &s), first);
        assert_eq!(tidy(&first), first);
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert!(matches!(
            TemplateSpec::parse("fancy"),
            Err(TemplateError::UnknownPreset(ref n)) if n == "fancy"
        ));
    }
}
