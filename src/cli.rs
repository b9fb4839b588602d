//! Command-line interface definitions for dupfinder.
//!
//! Global options (verbosity, color, JSON errors) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Scan a directory and write duplicate_report.txt
//! dupfinder scan ~/Pictures
//!
//! # Continue a scan that was interrupted with Ctrl+C
//! dupfinder scan ~/Pictures --resume
//!
//! # Only consider PDFs between 100 KB and 2 GB
//! dupfinder scan ~/Documents --only-ext pdf --min-size 100 --max-size 2 --max-unit gb
//!
//! # After editing the report, check it and apply it
//! dupfinder check duplicate_report.txt
//! dupfinder apply duplicate_report.txt --trash
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::SizeUnit;
use crate::report::KeepRule;

/// Find duplicate files by content and review them through an editable report.
#[derive(Debug, Parser)]
#[command(name = "dupfinder")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory and write a duplicate report
    Scan(ScanArgs),

    /// Validate an edited report without touching any files
    Check(CheckArgs),

    /// Remove every file a report marks REMOVE
    Apply(ApplyArgs),

    /// Delete the scan checkpoint stored in a directory
    Clear(ClearArgs),
}

/// Arguments for the `scan` subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Reuse fingerprints saved by a previous (possibly interrupted) scan
    #[arg(long)]
    pub resume: bool,

    /// Discard any saved checkpoint before scanning
    #[arg(long, conflicts_with = "resume")]
    pub fresh: bool,

    /// Where to write the report [default: duplicate_report.txt]
    #[arg(short, long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Which file of each group is marked KEEP
    #[arg(short, long, value_enum)]
    pub keep: Option<KeepArg>,

    /// Skip files with these extensions (comma-separated, e.g. "tmp,log")
    #[arg(long, value_name = "EXT", value_delimiter = ',')]
    pub ignore_ext: Vec<String>,

    /// Only consider files with these extensions
    #[arg(long, value_name = "EXT", value_delimiter = ',', conflicts_with = "ignore_ext")]
    pub only_ext: Vec<String>,

    /// Skip files smaller than this (in --min-unit)
    #[arg(long, value_name = "N")]
    pub min_size: Option<f64>,

    /// Unit for --min-size
    #[arg(long, value_enum, default_value = "kb")]
    pub min_unit: UnitArg,

    /// Skip files larger than this (in --max-unit)
    #[arg(long, value_name = "N")]
    pub max_size: Option<f64>,

    /// Unit for --max-size
    #[arg(long, value_enum, default_value = "mb")]
    pub max_unit: UnitArg,

    /// Skip hidden files and directories (names starting with '.')
    #[arg(long)]
    pub skip_hidden: bool,

    /// Confirm each group byte-for-byte after hashing
    #[arg(long)]
    pub verify: bool,

    /// Do not show a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the `check` subcommand.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Report file to validate
    #[arg(value_name = "REPORT")]
    pub report: PathBuf,
}

/// Arguments for the `apply` subcommand.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Report file to apply
    #[arg(value_name = "REPORT")]
    pub report: PathBuf,

    /// Move files to the system trash
    #[arg(long)]
    pub trash: bool,

    /// Delete files permanently
    #[arg(long, conflicts_with = "trash")]
    pub permanent: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the `clear` subcommand.
#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Directory whose checkpoint should be removed
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Only remove a leftover scan lock, keeping saved progress
    #[arg(long)]
    pub lock_only: bool,
}

/// Keep rule as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeepArg {
    /// Keep the file with the earliest modification time
    Oldest,
    /// Keep the file with the latest modification time
    Newest,
    /// Keep the file with the shortest path
    ShortestPath,
    /// Keep the first file found
    FirstFound,
}

impl From<KeepArg> for KeepRule {
    fn from(arg: KeepArg) -> Self {
        match arg {
            KeepArg::Oldest => Self::Oldest,
            KeepArg::Newest => Self::Newest,
            KeepArg::ShortestPath => Self::ShortestPath,
            KeepArg::FirstFound => Self::FirstFound,
        }
    }
}

/// Size unit as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitArg {
    Kb,
    Mb,
    Gb,
}

impl From<UnitArg> for SizeUnit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Kb => Self::KB,
            UnitArg::Mb => Self::MB,
            UnitArg::Gb => Self::GB,
        }
    }
}
