//! Duplicate report: rendering, validation and parsing.
//!
//! The report is a plain UTF-8 text file that doubles as a human-editable
//! decision log. Each duplicate group gets a header line followed by one
//! tab-separated line per file:
//!
//! ```text
//! # [md5: 5d41402abc4b2a76b9719d911017c592] [size: 1.2MB] [3 files]
//! KEEP	2024-01-05 09:14	/photos/2024/img_001.jpg
//! REMOVE	2024-02-11 17:02	/photos/backup/img_001.jpg
//! REMOVE	2024-03-20 08:45	/photos/old/img_001 (copy).jpg
//!
//! # [md5: ...] ...
//! ```
//!
//! The user may flip `KEEP`/`REMOVE` tokens before the report is loaded
//! back. Loading always validates first; a group left without any `KEEP`
//! is rejected so that at least one copy of every file survives.
//!
//! # Submodules
//!
//! * [`keep_rule`]: Which member of a group is kept.
//! * [`format`]: Size and timestamp formatting.
//! * [`writer`]: [`generate_report`].
//! * [`parser`]: [`validate_report`], [`load_report`], [`get_files_to_remove`].

pub mod format;
pub mod keep_rule;
pub mod parser;
pub mod writer;

use std::path::PathBuf;

use thiserror::Error;

pub use format::{format_size, format_time};
pub use keep_rule::{sort_by_keep_rule, KeepRule};
pub use parser::{
    get_files_to_remove, load_report, parse_report, validate_report, Action, ReportEntry,
    ReportIssue, Validation,
};
pub use writer::{generate_report, write_report};

/// Errors raised while writing or loading a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report file could not be written or read.
    #[error("report I/O error for {path}: {source}")]
    Io {
        /// Report path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The report failed validation.
    #[error("{0}")]
    Invalid(#[from] ReportIssue),
}
