//! Configuration for the chapter namer.
//!
//! This module provides:
//! - Typed partial layers read from JSON or TOML documents
//! - A per-leaf merge of defaults, document and command-line overrides
//! - Validation of sampling parameters at resolve time
//! - Atomic creation of a commented default document
//!
//! # Example
//!
//! ```no_run
//! use mcn_core::config::{load_document, resolve, ConfigLayer};
//!
//! let document = load_document("config.json".as_ref()).unwrap();
//! let overrides = ConfigLayer::default();
//! let config = resolve(&ConfigLayer::defaults(), Some(&document), &overrides).unwrap();
//! println!("Strategy: {}", config.recognition.strategy);
//! ```

mod document;
mod resolver;
mod settings;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use document::{
    create_default_config, default_document, load_document, parse_document, ConfigLayer,
    DocumentFormat, OptionsLayer, RecognitionLayer, ToolsLayer,
};
pub use resolver::resolve;
pub use settings::{
    Config, RecognitionSettings, RunOptions, SamplingStrategy, ToolPaths, DEFAULT_DURATION_SECS,
    DEFAULT_OFFSET_SECS, DEFAULT_PERCENTAGE,
};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unknown sampling strategy '{0}' (expected start, middle, end or custom)")]
    UnknownStrategy(String),

    #[error("Unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
