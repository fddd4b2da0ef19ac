//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use mcn_core::config::{ConfigLayer, OptionsLayer, RecognitionLayer, ToolsLayer};

/// Rename MKV chapters after the songs playing in them.
#[derive(Parser, Debug)]
#[command(name = "mkv-chapter-namer", version, about)]
pub struct CliArgs {
    /// MKV file to process, or a directory to process every MKV file in it
    pub target: Option<PathBuf>,

    /// Write the result to this file instead of modifying the source
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Preset name or a custom format such as "{name} - {artist}"
    #[arg(long, help_heading = "Template")]
    pub template: Option<String>,

    /// List the template presets and exit
    #[arg(long, help_heading = "Template")]
    pub list_templates: bool,

    /// List the template variables and exit
    #[arg(long, help_heading = "Template")]
    pub show_variables: bool,

    /// Where to sample inside each chapter: start, middle, end or custom
    #[arg(long, help_heading = "Recognition")]
    pub strategy: Option<String>,

    /// Seconds after the chapter start (start strategy)
    #[arg(long, help_heading = "Recognition")]
    pub offset: Option<f64>,

    /// Position inside the chapter from 0.0 to 1.0 (custom strategy)
    #[arg(long, help_heading = "Recognition")]
    pub percentage: Option<f64>,

    /// Sample length in seconds
    #[arg(long, help_heading = "Recognition")]
    pub duration: Option<f64>,

    /// JSON or TOML config document
    #[arg(long, help_heading = "Config")]
    pub config: Option<PathBuf>,

    /// Write a commented default config document and exit
    #[arg(long, value_name = "PATH", help_heading = "Config")]
    pub create_config: Option<PathBuf>,

    #[arg(long, visible_alias = "ffmpeg", help_heading = "Tools")]
    pub ffmpeg_path: Option<PathBuf>,

    #[arg(long, visible_alias = "mkvextract", help_heading = "Tools")]
    pub mkv_extract_path: Option<PathBuf>,

    #[arg(long, visible_alias = "mkvpropedit", help_heading = "Tools")]
    pub mkv_propedit_path: Option<PathBuf>,

    /// Song recognition helper program
    #[arg(long, help_heading = "Tools")]
    pub recognizer_path: Option<PathBuf>,

    /// Do not back up the original chapters
    #[arg(long)]
    pub no_backup: bool,

    /// Do not look for the external tools before running
    #[arg(long, visible_alias = "skip-check")]
    pub skip_tool_check: bool,

    /// Restore chapters from a backup instead of renaming
    #[arg(long)]
    pub restore: bool,

    /// Backup to restore from (default: next to the media file)
    #[arg(long, requires = "restore")]
    pub backup_file: Option<PathBuf>,

    /// Process files in a directory even if they already have a backup
    #[arg(long)]
    pub no_skip: bool,

    /// Search directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Also append log output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl CliArgs {
    /// The highest-precedence config layer: only flags that were given.
    pub fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            mkv_file: self.target.clone(),
            output: self.output.clone(),
            template: self.template.clone(),
            custom_template: None,
            recognition: RecognitionLayer {
                strategy: self.strategy.clone(),
                offset: self.offset,
                percentage: self.percentage,
                duration: self.duration,
            },
            tools: ToolsLayer {
                ffmpeg: self.ffmpeg_path.clone(),
                mkvextract: self.mkv_extract_path.clone(),
                mkvpropedit: self.mkv_propedit_path.clone(),
                recognizer: self.recognizer_path.clone(),
            },
            options: OptionsLayer {
                no_backup: self.no_backup.then_some(true),
                skip_check: self.skip_tool_check.then_some(true),
            },
        }
    }
}
