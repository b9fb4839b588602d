//! Report validation and parsing.
//!
//! Validation streams the file once and stops at the first problem. It
//! checks, in file order:
//!
//! * every data line has at least three tab-separated fields and a non-empty path
//! * the action token is exactly `KEEP` or `REMOVE`
//! * when a group closes (next header or end of file) it holds at least one `KEEP`
//!
//! Blank lines are ignored and any line starting with `#` opens a new group.
//! Data lines before the first header form an unnamed group that obeys the
//! same rules. A trailing `\r` is stripped so reports edited on Windows
//! still load.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use super::ReportError;

/// Decision for one file in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Leave the file in place
    Keep,
    /// Hand the file to the sink
    Remove,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => f.write_str("KEEP"),
            Self::Remove => f.write_str("REMOVE"),
        }
    }
}

impl FromStr for Action {
    type Err = ();

    /// Tokens are case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KEEP" => Ok(Self::Keep),
            "REMOVE" => Ok(Self::Remove),
            _ => Err(()),
        }
    }
}

/// One data line of a parsed report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// KEEP or REMOVE
    pub action: Action,
    /// Timestamp text exactly as written in the report
    pub timestamp: String,
    /// File path
    pub path: PathBuf,
    /// Fingerprint from the enclosing header, if it had one
    pub fingerprint: Option<String>,
}

/// First problem found in a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportIssue {
    /// The report file does not exist.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// The report could not be read (permissions, invalid UTF-8, ...).
    #[error("Could not read report: {0}")]
    Unreadable(String),

    /// A data line has too few fields or an empty path.
    #[error("Invalid format on line {line}")]
    InvalidFormat {
        /// 1-based line number
        line: usize,
    },

    /// A data line has an unknown action token.
    #[error("Invalid action '{action}' on line {line}")]
    InvalidAction {
        /// The token found
        action: String,
        /// 1-based line number
        line: usize,
    },

    /// A group contains no KEEP entry.
    #[error("Group with {group} (line {line}) has no KEEP entry")]
    NoKeep {
        /// Group label from its header, e.g. `md5: 5d41...`
        group: String,
        /// Line of the group's header (or first entry if it has none)
        line: usize,
    },
}

impl ReportIssue {
    /// Line number the issue refers to, where applicable.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::InvalidFormat { line }
            | Self::InvalidAction { line, .. }
            | Self::NoKeep { line, .. } => Some(*line),
            Self::NotFound(_) | Self::Unreadable(_) => None,
        }
    }
}

/// Outcome of [`validate_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The report is well formed.
    Valid,
    /// The first problem found.
    Invalid(ReportIssue),
}

impl Validation {
    /// Whether the report passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Human-readable reason, empty when valid.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Valid => String::new(),
            Self::Invalid(issue) => issue.to_string(),
        }
    }

    /// The issue, if any.
    #[must_use]
    pub fn issue(&self) -> Option<&ReportIssue> {
        match self {
            Self::Valid => None,
            Self::Invalid(issue) => Some(issue),
        }
    }
}

/// Group being accumulated while streaming.
struct OpenGroup {
    label: String,
    fingerprint: Option<String>,
    line: Option<usize>,
    entries: usize,
    keeps: usize,
}

impl OpenGroup {
    fn unnamed() -> Self {
        Self {
            label: "no header".to_string(),
            fingerprint: None,
            line: None,
            entries: 0,
            keeps: 0,
        }
    }

    fn from_header(header: &str, line: usize) -> Self {
        let label = header_label(header);
        let fingerprint = label
            .strip_prefix("md5:")
            .map(|fp| fp.trim().to_string())
            .filter(|fp| !fp.is_empty());
        Self {
            label,
            fingerprint,
            line: Some(line),
            entries: 0,
            keeps: 0,
        }
    }

    fn close(&self) -> Result<(), ReportIssue> {
        if self.entries > 0 && self.keeps == 0 {
            return Err(ReportIssue::NoKeep {
                group: self.label.clone(),
                line: self.line.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

/// Text of the first `[...]` in a header, e.g. `md5: 5d41...`.
fn header_label(header: &str) -> String {
    let body = header.trim_start_matches('#').trim_start();
    let body = body.strip_prefix('[').unwrap_or(body);
    body.split(']').next().unwrap_or_default().trim().to_string()
}

/// Stream `reader`, validating every line and handing each entry to `on_entry`.
///
/// # Errors
///
/// Returns the first [`ReportIssue`] encountered.
pub fn parse_report<R: BufRead>(
    reader: R,
    mut on_entry: impl FnMut(ReportEntry),
) -> Result<(), ReportIssue> {
    let mut group = OpenGroup::unnamed();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.map_err(|e| ReportIssue::Unreadable(e.to_string()))?;
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if line.starts_with('#') {
            group.close()?;
            group = OpenGroup::from_header(line, line_number);
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.splitn(3, '\t').collect();
        if fields.len() < 3 || fields[2].is_empty() {
            return Err(ReportIssue::InvalidFormat { line: line_number });
        }

        let action = fields[0]
            .parse::<Action>()
            .map_err(|()| ReportIssue::InvalidAction {
                action: fields[0].to_string(),
                line: line_number,
            })?;

        group.line.get_or_insert(line_number);
        group.entries += 1;
        if action == Action::Keep {
            group.keeps += 1;
        }

        on_entry(ReportEntry {
            action,
            timestamp: fields[1].to_string(),
            path: PathBuf::from(fields[2]),
            fingerprint: group.fingerprint.clone(),
        });
    }

    group.close()
}

fn open_report(path: &Path) -> Result<BufReader<File>, ReportIssue> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ReportIssue::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(ReportIssue::Unreadable(e.to_string())),
    }
}

/// Check a report for well-formedness without keeping its entries.
#[must_use]
pub fn validate_report(path: &Path) -> Validation {
    let result = open_report(path).and_then(|reader| parse_report(reader, |_| {}));
    match result {
        Ok(()) => Validation::Valid,
        Err(issue) => {
            log::debug!("Report {} is invalid: {}", path.display(), issue);
            Validation::Invalid(issue)
        }
    }
}

/// Validate and then parse a report into its entries.
///
/// Header and blank lines produce no entries.
///
/// # Errors
///
/// - [`ReportError::Invalid`] carrying the validation issue
/// - [`ReportError::Io`] if the file changes underneath between passes
pub fn load_report(path: &Path) -> Result<Vec<ReportEntry>, ReportError> {
    if let Validation::Invalid(issue) = validate_report(path) {
        return Err(ReportError::Invalid(issue));
    }

    let file = File::open(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    parse_report(BufReader::new(file), |entry| entries.push(entry))?;
    log::debug!("Loaded {} report entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Paths of every entry marked REMOVE, in report order.
#[must_use]
pub fn get_files_to_remove(entries: &[ReportEntry]) -> Vec<PathBuf> {
    entries
        .iter()
        .filter(|e| e.action == Action::Remove)
        .map(|e| e.path.clone())
        .collect()
}
