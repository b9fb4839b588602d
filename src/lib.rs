//! dupfinder - resumable duplicate file finder
//!
//! Scans a directory tree, groups files by MD5 content fingerprint and
//! writes an editable KEEP/REMOVE report. Per-file fingerprints are saved
//! to a SQLite checkpoint in the scanned root as they are computed, so an
//! interrupted scan resumes where it stopped.
//!
//! The pipeline is exposed as a library:
//!
//! - [`scanner`]: enumeration, filtering, hashing, grouping
//! - [`checkpoint`]: the per-root fingerprint store and scan lock
//! - [`report`]: report rendering, validation and parsing
//! - [`actions`]: trash / permanent-delete sinks
//!
//! [`run_app`] is the thin command-line driver on top.

pub mod actions;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use yansi::Paint;

use crate::actions::SinkKind;
use crate::cli::{ApplyArgs, CheckArgs, ClearArgs, Cli, Commands, ScanArgs};
use crate::config::{ScanConfig, Settings};
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::report::{generate_report, get_files_to_remove, load_report, validate_report, Validation};
use crate::scanner::Scanner;

/// Run one CLI invocation and return the exit code to report.
///
/// # Errors
///
/// Any failure that should end the process: invalid configuration, scan
/// failure or interruption, an invalid report passed to `apply`, or a
/// failed sink operation.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let settings = Settings::load().context("Failed to load settings")?;

    match cli.command {
        Commands::Scan(args) => run_scan(&args, &settings, cli.quiet),
        Commands::Check(args) => run_check(&args),
        Commands::Apply(args) => run_apply(&args, &settings),
        Commands::Clear(args) => run_clear(&args),
    }
}

fn build_scan_config(args: &ScanArgs, settings: &Settings) -> Result<ScanConfig> {
    let report_path = args
        .report
        .clone()
        .unwrap_or_else(|| settings.report_path.clone());

    let mut builder = ScanConfig::builder(args.path.clone())
        .resume(args.resume)
        .report_path(report_path)
        .skip_hidden(args.skip_hidden || settings.skip_hidden)
        .verify(args.verify);

    if !args.ignore_ext.is_empty() {
        builder = builder.ignore_extensions(&args.ignore_ext);
    }
    if !args.only_ext.is_empty() {
        builder = builder.only_extensions(&args.only_ext);
    }
    if let Some(value) = args.min_size {
        builder = builder.min_size(value, args.min_unit.into());
    }
    if let Some(value) = args.max_size {
        builder = builder.max_size(value, args.max_unit.into());
    }

    builder.build().context("Invalid scan options")
}

fn run_scan(args: &ScanArgs, settings: &Settings, quiet: bool) -> Result<ExitCode> {
    let config = build_scan_config(args, settings)?;
    let keep_rule = args.keep.map_or(settings.keep_rule, Into::into);

    if args.fresh {
        if checkpoint::clear(config.root_dir())? {
            log::info!("Discarded previous checkpoint");
        }
    } else if !args.resume && checkpoint::db_path(config.root_dir()).exists() {
        println!(
            "{} A previous scan was found; pass --resume to reuse it.",
            "Note:".yellow().bold()
        );
    }

    let handler = signal::install_handler()?;
    let mut scanner = Scanner::new(config).with_shutdown_flag(handler.get_flag());
    if !args.no_progress {
        scanner = scanner.with_progress_callback(Arc::new(Progress::new(quiet)));
    }

    println!("Scanning {} ...", scanner.config().root_dir().display());
    let (groups, summary) = scanner.scan()?;

    println!(
        "{} {} file(s) visited, {} hashed, {} reused from checkpoint, {} skipped by filters.",
        "Scan complete:".green().bold(),
        summary.files_visited,
        summary.files_hashed,
        summary.checkpoint_hits,
        summary.files_skipped
    );

    if groups.is_empty() {
        println!("No duplicate files found!");
        return Ok(ExitCode::NoDuplicates);
    }

    let report_path = scanner.config().report_path();
    generate_report(&groups, report_path, keep_rule)
        .with_context(|| format!("Failed to write report {}", report_path.display()))?;

    println!(
        "Found {} duplicate group(s) ({} files total, {} reclaimable).",
        summary.duplicate_groups.bold(),
        summary.duplicate_files,
        summary.reclaimable_display()
    );
    println!("Report written to: {}", report_path.display().cyan());
    println!(
        "Review and edit it, then run: dupfinder apply {}",
        report_path.display()
    );

    Ok(ExitCode::Success)
}

fn run_check(args: &CheckArgs) -> Result<ExitCode> {
    match validate_report(&args.report) {
        Validation::Valid => {
            println!("{} {}", "Report is valid:".green().bold(), args.report.display());
            Ok(ExitCode::Success)
        }
        invalid => {
            eprintln!("{} {}", "Invalid report:".red().bold(), invalid.message());
            Ok(ExitCode::InvalidReport)
        }
    }
}

fn run_apply(args: &ApplyArgs, settings: &Settings) -> Result<ExitCode> {
    let entries = load_report(&args.report)?;
    let to_remove = get_files_to_remove(&entries);
    let to_keep = entries.len() - to_remove.len();

    println!(
        "{} file(s) to remove, {} file(s) to keep.",
        to_remove.len().bold(),
        to_keep
    );
    if to_remove.is_empty() {
        println!("Nothing to remove (all files marked KEEP).");
        return Ok(ExitCode::Success);
    }

    let sink = if args.permanent {
        SinkKind::Delete
    } else if args.trash {
        SinkKind::Trash
    } else {
        SinkKind::from_use_trash(settings.use_trash)
    };

    if !args.yes && !confirm(&format!("Proceed with {}?", sink))? {
        println!("Deletion cancelled.");
        return Ok(ExitCode::Success);
    }

    let summary = sink.execute(&to_remove)?;
    println!("{}", summary.summary().green());
    Ok(ExitCode::Success)
}

fn run_clear(args: &ClearArgs) -> Result<ExitCode> {
    if args.lock_only {
        if checkpoint::ScanLock::force_release(&args.path)? {
            println!("Scan lock removed for {}", args.path.display());
        } else {
            println!("No scan lock found in {}", args.path.display());
        }
        return Ok(ExitCode::Success);
    }

    if checkpoint::clear(&args.path)? {
        println!("Checkpoint cleared for {}", args.path.display());
    } else {
        println!("No checkpoint found in {}", args.path.display());
    }
    Ok(ExitCode::Success)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
