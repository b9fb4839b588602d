//! Exit codes and structured error output.

use serde::Serialize;

use crate::report::ReportError;
use crate::scanner::FinderError;

/// Process exit codes.
///
/// - 0: Success
/// - 1: General error (unexpected failure)
/// - 2: Scan completed but found no duplicates
/// - 3: A report failed validation
/// - 130: Scan paused by the user (Ctrl+C); rerun with `--resume`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// The report is malformed or has a group without KEEP.
    InvalidReport = 3,
    /// Scan was interrupted; progress is saved.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DF000",
            Self::GeneralError => "DF001",
            Self::NoDuplicates => "DF002",
            Self::InvalidReport => "DF003",
            Self::Interrupted => "DF130",
        }
    }

    /// Classify a top-level error.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(FinderError::Interrupted) = cause.downcast_ref::<FinderError>() {
                return Self::Interrupted;
            }
            if let Some(ReportError::Invalid(_)) = cause.downcast_ref::<ReportError>() {
                return Self::InvalidReport;
            }
        }
        Self::GeneralError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DF001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the scan was paused and can be resumed
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
