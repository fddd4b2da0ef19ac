//! Config documents: partial configuration layers and their files.
//!
//! A layer leaves every leaf optional so that defaults, a config file and
//! command-line overrides can be merged field by field. Files ending in
//! `.toml` are TOML; everything else is read as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::settings::{
    SamplingStrategy, DEFAULT_DURATION_SECS, DEFAULT_OFFSET_SECS, DEFAULT_PERCENTAGE,
};
use super::{ConfigError, ConfigResult};
use crate::fs_util::write_atomic;
use crate::template::DEFAULT_PRESET;

/// Sampling parameters of one layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Tool paths of one layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mkvextract: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mkvpropedit: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recognizer: Option<PathBuf>,
}

/// Switches of one layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionsLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_backup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_check: Option<bool>,
}

/// One partial configuration layer.
///
/// Unknown keys are ignored when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mkv_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_template: Option<String>,

    #[serde(default)]
    pub recognition: RecognitionLayer,
    #[serde(default)]
    pub tools: ToolsLayer,
    #[serde(default)]
    pub options: OptionsLayer,
}

impl ConfigLayer {
    /// The built-in defaults as a layer.
    pub fn defaults() -> Self {
        Self {
            mkv_file: None,
            output: None,
            template: Some(DEFAULT_PRESET.to_string()),
            custom_template: None,
            recognition: RecognitionLayer {
                strategy: Some(SamplingStrategy::default().as_str().to_string()),
                offset: Some(DEFAULT_OFFSET_SECS),
                percentage: Some(DEFAULT_PERCENTAGE),
                duration: Some(DEFAULT_DURATION_SECS),
            },
            tools: ToolsLayer::default(),
            options: OptionsLayer {
                no_backup: Some(false),
                skip_check: Some(false),
            },
        }
    }
}

/// On-disk format of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Parse a config document.
pub fn parse_document(content: &str, format: DocumentFormat) -> Result<ConfigLayer, String> {
    match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        DocumentFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    }
}

/// Load a config document from disk.
pub fn load_document(path: &Path) -> ConfigResult<ConfigLayer> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let layer = parse_document(&content, DocumentFormat::from_path(path)).map_err(|message| {
        ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        }
    })?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(layer)
}

/// Notes written into generated JSON documents (JSON has no comments).
const COMMENTS: &[(&str, &str)] = &[
    ("mkv_file", "MKV file to process (optional, the command line wins)"),
    ("output", "Write the result to this file instead of modifying the input"),
    (
        "template",
        "Preset name (default, with_trans, full, simple, artist_first, with_id, detailed, japanese, minimal) or a format string",
    ),
    ("custom_template", "Format string, takes precedence over template"),
    ("recognition.strategy", "start | middle | end | custom"),
    ("recognition.offset", "Seconds after the chapter start (start strategy)"),
    ("recognition.percentage", "Position as a fraction 0.0-1.0 (custom strategy)"),
    ("recognition.duration", "Sample length in seconds"),
    ("tools", "Explicit tool paths; leave out for auto-detection"),
    ("options.no_backup", "Do not back up chapters before renaming"),
    ("options.skip_check", "Skip the tool availability check"),
];

/// Render the default document in `format`.
pub fn default_document(format: DocumentFormat) -> ConfigResult<String> {
    let layer = ConfigLayer::defaults();
    match format {
        DocumentFormat::Json => {
            let mut value =
                serde_json::to_value(&layer).map_err(|e| ConfigError::Serialize(e.to_string()))?;
            let comments: serde_json::Map<String, serde_json::Value> = COMMENTS
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
                .collect();
            if let Some(obj) = value.as_object_mut() {
                obj.insert("_comments".to_string(), serde_json::Value::Object(comments));
            }
            let mut out = serde_json::to_string_pretty(&value)
                .map_err(|e| ConfigError::Serialize(e.to_string()))?;
            out.push('\n');
            Ok(out)
        }
        DocumentFormat::Toml => {
            let mut out = String::new();
            out.push_str("# MKV chapter namer configuration\n");
            for (key, note) in COMMENTS {
                out.push_str(&format!("# {}: {}\n", key, note));
            }
            out.push('\n');
            out.push_str(
                &toml::to_string_pretty(&layer).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            );
            Ok(out)
        }
    }
}

/// Write the default document to `path`, format chosen by extension.
pub fn create_default_config(path: &Path) -> ConfigResult<()> {
    let content = default_document(DocumentFormat::from_path(path))?;
    write_atomic(path, &content)?;
    tracing::info!("Created config file {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn json_document_ignores_unknown_keys() {
        let json = r#"{
            "template": "full",
            "recognition": {"offset": 8.0, "future_option": 1},
            "_comments": {"template": "..."}
        }"#;
        let layer = parse_document(json, DocumentFormat::Json).unwrap();
        assert_eq!(layer.template.as_deref(), Some("full"));
        assert_eq!(layer.recognition.offset, Some(8.0));
        assert_eq!(layer.recognition.duration, None);
    }

    #[test]
    fn toml_document_parses_sections() {
        let toml = "custom_template = \"{name}\"\n[recognition]\nstrategy = \"middle\"\n[options]\nno_backup = true\n";
        let layer = parse_document(toml, DocumentFormat::Toml).unwrap();
        assert_eq!(layer.custom_template.as_deref(), Some("{name}"));
        assert_eq!(layer.recognition.strategy.as_deref(), Some("middle"));
        assert_eq!(layer.options.no_backup, Some(true));
    }

    #[test]
    fn malformed_document_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_document_is_not_found() {
        let dir = tempdir().unwrap();
        let err = load_document(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn created_json_config_loads_back_as_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        create_default_config(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("_comments"));
        assert_eq!(load_document(&path).unwrap(), ConfigLayer::defaults());
        let files: Vec<_> = fs::read_dir(dir.path().join("nested")).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn created_toml_config_loads_back_as_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        create_default_config(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# MKV chapter namer configuration"));
        assert!(content.contains("[recognition]"));
        assert_eq!(load_document(&path).unwrap(), ConfigLayer::defaults());
    }
}
