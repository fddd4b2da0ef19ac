//! Locating and verifying external tools.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::ToolError;

/// Common install folders probed on Windows when a tool is not on PATH.
#[cfg(windows)]
fn platform_search_dirs(tool_name: &str) -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from(r"C:\Program Files\MKVToolNix"),
        PathBuf::from(r"C:\Program Files (x86)\MKVToolNix"),
    ];
    if let Some(local) = env::var_os("LOCALAPPDATA") {
        dirs.push(PathBuf::from(local).join("Programs").join("MKVToolNix"));
    }
    if tool_name == "ffmpeg" {
        dirs.push(PathBuf::from(r"C:\ffmpeg\bin"));
        dirs.push(PathBuf::from(r"C:\Program Files\ffmpeg\bin"));
        if let Some(home) = env::var_os("USERPROFILE") {
            dirs.push(PathBuf::from(home).join("ffmpeg").join("bin"));
        }
    }
    dirs
}

#[cfg(not(windows))]
fn platform_search_dirs(_tool_name: &str) -> Vec<PathBuf> {
    Vec::new()
}

/// File name of an executable on this platform.
fn executable_name(tool_name: &str) -> String {
    if cfg!(windows) && Path::new(tool_name).extension().is_none() {
        format!("{}.exe", tool_name)
    } else {
        tool_name.to_string()
    }
}

/// Find a tool by name on PATH, then in platform install folders.
pub fn find_tool(tool_name: &str) -> Option<PathBuf> {
    let exe = executable_name(tool_name);

    let path_dirs = env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).collect::<Vec<_>>())
        .unwrap_or_default();

    path_dirs
        .into_iter()
        .chain(platform_search_dirs(tool_name))
        .map(|dir| dir.join(&exe))
        .find(|candidate| candidate.is_file())
}

/// Check that `program` can be resolved without running it.
///
/// Paths with a directory component must exist; bare names must be
/// found by [`find_tool`].
pub fn ensure_resolvable(tool_name: &str, program: &Path) -> Result<PathBuf, ToolError> {
    let has_dir = program
        .parent()
        .map(|p| !p.as_os_str().is_empty())
        .unwrap_or(false);

    if has_dir {
        if program.is_file() {
            return Ok(program.to_path_buf());
        }
        return Err(ToolError::unavailable(
            tool_name,
            format!("file does not exist: {}", program.display()),
        ));
    }

    find_tool(&program.to_string_lossy())
        .ok_or_else(|| ToolError::unavailable(tool_name, "not found on PATH"))
}

/// Run the tool's version command and judge whether it is usable.
///
/// Output mentioning the tool or "version" counts as success even with a
/// non-zero exit code, since some builds print their banner and exit 1.
pub fn verify_tool(program: &Path, tool_name: &str) -> Result<(), ToolError> {
    let version_arg = if tool_name == "ffmpeg" {
        "-version"
    } else {
        "--version"
    };

    tracing::debug!("Verifying {}: {} {}", tool_name, program.display(), version_arg);

    let output = Command::new(program)
        .arg(version_arg)
        .output()
        .map_err(|e| {
            ToolError::unavailable(tool_name, format!("failed to run {}: {}", program.display(), e))
        })?;

    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
    .to_lowercase();

    if text.contains(&tool_name.to_lowercase()) || text.contains("version") || output.status.success()
    {
        Ok(())
    } else {
        Err(ToolError::unavailable(
            tool_name,
            format!(
                "{} exited with code {}",
                program.display(),
                output.status.code().unwrap_or(-1)
            ),
        ))
    }
}
