//! Chapter access through MKVToolNix.
//!
//! Reads chapters with `mkvextract` and writes them back with
//! `mkvpropedit`, handing the XML over in a temporary file.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::tools::{ensure_resolvable, ToolError, MKVEXTRACT, MKVPROPEDIT};

use super::parser::{parse_chapter_xml, serialize_chapter_xml};
use super::types::{Chapter, ChapterError, ChapterResult};
use super::ChapterSource;

/// [`ChapterSource`] backed by the `mkvextract`/`mkvpropedit` programs.
#[derive(Debug, Clone)]
pub struct MkvToolnix {
    mkvextract: PathBuf,
    mkvpropedit: PathBuf,
}

impl MkvToolnix {
    pub fn new(mkvextract: impl Into<PathBuf>, mkvpropedit: impl Into<PathBuf>) -> Self {
        Self {
            mkvextract: mkvextract.into(),
            mkvpropedit: mkvpropedit.into(),
        }
    }

    /// Extract raw chapter XML; `None` when the file carries no chapters.
    fn extract_xml(&self, media_path: &Path) -> ChapterResult<Option<String>> {
        let temp = tempfile::Builder::new()
            .prefix("mcn_chapters_")
            .suffix(".xml")
            .tempfile()?;

        tracing::debug!(
            "Extracting chapters from {} to {}",
            media_path.display(),
            temp.path().display()
        );

        let output = Command::new(&self.mkvextract)
            .arg(media_path)
            .arg("chapters")
            .arg(temp.path())
            .output()
            .map_err(|e| {
                ChapterError::read(media_path, format!("failed to run mkvextract: {}", e))
            })?;

        if !output.status.success() {
            return Err(ChapterError::CommandFailed {
                tool: MKVEXTRACT.to_string(),
                exit_code: output.status.code().unwrap_or(-1),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // mkvextract leaves the target empty when there are no chapters
        let xml = std::fs::read_to_string(temp.path())?;
        if xml.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(xml))
    }
}

impl ChapterSource for MkvToolnix {
    fn read_chapters(&self, media_path: &Path) -> Result<Vec<Chapter>, ChapterError> {
        let xml = match self.extract_xml(media_path) {
            Ok(Some(xml)) => xml,
            Ok(None) => {
                tracing::debug!("No chapters found in {}", media_path.display());
                return Ok(Vec::new());
            }
            Err(e @ ChapterError::Read { .. }) => return Err(e),
            Err(e) => return Err(ChapterError::read(media_path, e.to_string())),
        };

        let chapters = parse_chapter_xml(&xml)
            .map_err(|e| ChapterError::read(media_path, e.to_string()))?;

        tracing::info!(
            "Read {} chapters from {}",
            chapters.len(),
            media_path.display()
        );
        Ok(chapters)
    }

    fn write_chapters(&self, media_path: &Path, chapters: &[Chapter]) -> Result<(), ChapterError> {
        let mut temp = tempfile::Builder::new()
            .prefix("mcn_chapters_")
            .suffix(".xml")
            .tempfile()
            .map_err(|e| ChapterError::write(media_path, e.to_string()))?;

        {
            use std::io::Write;
            temp.write_all(serialize_chapter_xml(chapters).as_bytes())
                .and_then(|_| temp.flush())
                .map_err(|e| ChapterError::write(media_path, e.to_string()))?;
        }

        tracing::debug!(
            "Writing {} chapters to {} via {}",
            chapters.len(),
            media_path.display(),
            temp.path().display()
        );

        let output = Command::new(&self.mkvpropedit)
            .arg(media_path)
            .arg("--chapters")
            .arg(temp.path())
            .output()
            .map_err(|e| {
                ChapterError::write(media_path, format!("failed to run mkvpropedit: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(ChapterError::write(
                media_path,
                format!(
                    "mkvpropedit exited with code {}: {}",
                    output.status.code().unwrap_or(-1),
                    detail.trim()
                ),
            ));
        }

        tracing::info!(
            "Wrote {} chapters to {}",
            chapters.len(),
            media_path.display()
        );
        Ok(())
    }

    fn check_available(&self) -> Result<(), ToolError> {
        ensure_resolvable(MKVEXTRACT, &self.mkvextract)?;
        ensure_resolvable(MKVPROPEDIT, &self.mkvpropedit)?;
        Ok(())
    }
}
