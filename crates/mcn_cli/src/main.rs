//! MKV Chapter Namer - command line entry point.

mod args;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use mcn_core::batch::{discover_media_files, BatchController, BatchSummary, RunMode};
use mcn_core::config::{create_default_config, load_document, resolve, Config, ConfigLayer};
use mcn_core::logging::{init_tracing, LogLevel};
use mcn_core::orchestrator::{CancelHandle, RecognitionOrchestrator, Verdict};
use mcn_core::template::{example_song, render, TemplateSpec, PRESETS, VARIABLES};
use mcn_core::tools::{ToolRequirement, Toolchain};

use args::CliArgs;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let _log_guard = match init_tracing(LogLevel::from_verbose(args.verbose), args.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to open log file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(summary) if summary.has_failures() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<BatchSummary> {
    if args.list_templates {
        print_templates();
        return Ok(BatchSummary::default());
    }
    if args.show_variables {
        print_variables();
        return Ok(BatchSummary::default());
    }
    if let Some(path) = &args.create_config {
        create_default_config(path)
            .with_context(|| format!("Could not create config at {}", path.display()))?;
        println!("Created default config: {}", path.display());
        return Ok(BatchSummary::default());
    }

    let config = load_config(&args)?;
    let target = match &config.mkv_file {
        Some(target) => target.clone(),
        None => bail!("No MKV file or directory given (pass one or set mkv_file in the config)"),
    };

    let requirement = if args.restore {
        ToolRequirement::Restore
    } else {
        ToolRequirement::Rename
    };
    let toolchain = if config.options.skip_check {
        Toolchain::unchecked(&config.tools)
    } else {
        Toolchain::detect(&config.tools, requirement).context("Required tools are missing")?
    };

    let cancel = CancelHandle::new();
    let handler_cancel = cancel.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("Interrupt received, stopping after the current step");
        handler_cancel.cancel();
    })
    .context("Could not install interrupt handler")?;

    let (files, batch) = collect_files(&target, args.recursive)?;
    if batch && config.output.is_some() {
        tracing::warn!("--output is ignored when processing a directory");
    }
    if batch && args.backup_file.is_some() {
        tracing::warn!("--backup-file is ignored when processing a directory");
    }
    if files.is_empty() {
        tracing::warn!("No MKV files found in {}", target.display());
        return Ok(BatchSummary::default());
    }

    let mode = if args.restore {
        RunMode::Restore {
            backup_file: if batch { None } else { args.backup_file.clone() },
        }
    } else {
        RunMode::Rename
    };

    tracing::info!(
        "Template: {} | Strategy: {}",
        config.template.label(),
        config.recognition.strategy
    );

    // A single named file is always processed, even if a backup exists.
    let controller = BatchController::new(RecognitionOrchestrator::from_toolchain(&toolchain), mode)
        .with_force(args.no_skip || !batch)
        .with_cancel_handle(cancel);
    let config = if batch {
        Config {
            output: None,
            ..config
        }
    } else {
        config
    };
    let summary = controller.run(&files, &config);

    if !batch {
        report_single(&summary);
    }
    Ok(summary)
}

/// Merge defaults, the optional config document and the command line.
fn load_config(args: &CliArgs) -> Result<Config> {
    let document = match &args.config {
        Some(path) => Some(load_document(path)?),
        None => None,
    };
    let config = resolve(&ConfigLayer::defaults(), document.as_ref(), &args.overrides())?;
    tracing::debug!("Resolved config: {:?}", config);
    Ok(config)
}

/// Expand `target` into media files; the flag says whether it was a directory.
fn collect_files(target: &Path, recursive: bool) -> Result<(Vec<PathBuf>, bool)> {
    if target.is_dir() {
        tracing::info!("Scanning {}", target.display());
        Ok((discover_media_files(target, recursive), true))
    } else if target.is_file() {
        Ok((vec![target.to_path_buf()], false))
    } else {
        bail!("File not found: {}", target.display())
    }
}

fn report_single(summary: &BatchSummary) {
    let Some(result) = summary.results.first() else {
        return;
    };
    match &result.verdict {
        Verdict::Success => {
            println!(
                "Recognized {}/{} chapters",
                result.counts.recognized,
                result.counts.total()
            );
            if let Some(path) = &result.written_to {
                println!("Chapters written to {}", path.display());
            }
            if let Some(path) = &result.backup_path {
                println!("Original chapters backed up to {}", path.display());
            }
        }
        Verdict::Restored => println!("Chapters restored from backup"),
        Verdict::Skipped(reason) => println!("Nothing to do: {}", reason),
        Verdict::Failed(message) => eprintln!("Failed: {}", message),
    }
}

fn print_templates() {
    let song = example_song();
    println!("Available templates:\n");
    for preset in PRESETS {
        println!("  {:<16} {}", preset.name, preset.format);
        println!("  {:<16} -> {}", "", render(&TemplateSpec::Preset(preset), &song));
    }
    println!("\nUse --template <name>, or pass a custom format containing {{variables}}.");
}

fn print_variables() {
    println!("Template variables:\n");
    for (name, description) in VARIABLES {
        println!("  {{{}}}  {}", name, description);
    }
}
