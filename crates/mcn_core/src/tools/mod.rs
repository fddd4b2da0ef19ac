//! External tool discovery.
//!
//! The pipeline shells out to four programs: `ffmpeg` for audio samples,
//! `mkvextract`/`mkvpropedit` for chapter metadata, and a recognizer
//! helper that fingerprints samples and looks them up. This module finds
//! them, verifies they run, and reports every missing tool at once.

mod discovery;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ToolPaths;

pub use discovery::{ensure_resolvable, find_tool, verify_tool};

/// Default program names.
pub const FFMPEG: &str = "ffmpeg";
pub const MKVEXTRACT: &str = "mkvextract";
pub const MKVPROPEDIT: &str = "mkvpropedit";
pub const RECOGNIZER: &str = "song-recognizer";

/// Errors raised while resolving external tools.
#[derive(Error, Debug, Clone)]
pub enum ToolError {
    /// A required tool is missing or does not run.
    #[error("{tool} is unavailable: {message}")]
    Unavailable { tool: String, message: String },

    /// Several tools are missing at once.
    #[error("missing tools: {}", .0.join(", "))]
    Missing(Vec<String>),
}

impl ToolError {
    pub fn unavailable(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Which tools a run needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolRequirement {
    /// Full recognition run: every tool.
    Rename,
    /// Restoring a backup only writes chapters.
    Restore,
}

impl ToolRequirement {
    fn tool_names(&self) -> &'static [&'static str] {
        match self {
            ToolRequirement::Rename => &[FFMPEG, MKVEXTRACT, MKVPROPEDIT, RECOGNIZER],
            ToolRequirement::Restore => &[MKVPROPEDIT],
        }
    }
}

/// Resolved program paths for every external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub mkvextract: PathBuf,
    pub mkvpropedit: PathBuf,
    pub recognizer: PathBuf,
}

impl Toolchain {
    /// Use configured paths as given, falling back to bare program names.
    ///
    /// Nothing is verified; this is the `skip_check` path.
    pub fn unchecked(paths: &ToolPaths) -> Self {
        let pick = |configured: &Option<PathBuf>, name: &str| {
            configured.clone().unwrap_or_else(|| PathBuf::from(name))
        };
        Self {
            ffmpeg: pick(&paths.ffmpeg, FFMPEG),
            mkvextract: pick(&paths.mkvextract, MKVEXTRACT),
            mkvpropedit: pick(&paths.mkvpropedit, MKVPROPEDIT),
            recognizer: pick(&paths.recognizer, RECOGNIZER),
        }
    }

    /// Locate and verify the tools `requirement` needs.
    ///
    /// A configured path always wins over auto-detection. Tools that are
    /// not required keep their unchecked value.
    pub fn detect(paths: &ToolPaths, requirement: ToolRequirement) -> Result<Self, ToolError> {
        let mut chain = Self::unchecked(paths);
        let mut missing = Vec::new();

        for &name in requirement.tool_names() {
            let configured = match name {
                FFMPEG => &paths.ffmpeg,
                MKVEXTRACT => &paths.mkvextract,
                MKVPROPEDIT => &paths.mkvpropedit,
                _ => &paths.recognizer,
            };

            let resolved = match configured {
                Some(path) => Some(path.clone()),
                None => find_tool(name),
            };

            match resolved {
                Some(path) => match verify_tool(&path, name) {
                    Ok(()) => {
                        tracing::info!("Found {}: {}", name, path.display());
                        *chain.slot_mut(name) = path;
                    }
                    Err(e) => {
                        tracing::error!("{}", e);
                        missing.push(name.to_string());
                    }
                },
                None => {
                    tracing::error!("{} not found", name);
                    missing.push(name.to_string());
                }
            }
        }

        if missing.is_empty() {
            Ok(chain)
        } else {
            Err(ToolError::Missing(missing))
        }
    }

    fn slot_mut(&mut self, name: &str) -> &mut PathBuf {
        match name {
            FFMPEG => &mut self.ffmpeg,
            MKVEXTRACT => &mut self.mkvextract,
            MKVPROPEDIT => &mut self.mkvpropedit,
            _ => &mut self.recognizer,
        }
    }
}
