//! File removal sinks.
//!
//! # Overview
//!
//! Two interchangeable ways to get rid of the paths a report marks `REMOVE`:
//! - Move to system trash (recoverable) via the `trash` crate
//! - Permanent deletion
//!
//! Both process paths in order and stop at the first failure. Paths before
//! the failing one are already gone; paths after it are untouched.
//!
//! # Example
//!
//! ```no_run
//! use dupfinder::actions::delete::SinkKind;
//! use std::path::PathBuf;
//!
//! let paths = vec![PathBuf::from("/photos/backup/img_001.jpg")];
//! match SinkKind::Trash.execute(&paths) {
//!     Ok(summary) => println!("{}", summary.summary()),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for sink operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0} - try running with elevated privileges")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Path the failure refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_stat(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}

/// Outcome of a completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkSummary {
    /// Number of files removed
    pub files: usize,
    /// Bytes those files occupied
    pub bytes: u64,
    /// Whether they went to the trash
    pub trashed: bool,
}

impl SinkSummary {
    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.trashed {
            "Moved to trash"
        } else {
            "Deleted"
        };
        format!(
            "{} {} file(s), freed {}",
            verb,
            self.files,
            bytesize::ByteSize(self.bytes)
        )
    }
}

/// Which terminal operation to apply to REMOVE paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkKind {
    /// Permanent deletion
    Delete,
    /// Move to the platform trash / recycle bin
    #[default]
    Trash,
}

impl SinkKind {
    /// Pick the sink from a "use trash" preference.
    #[must_use]
    pub fn from_use_trash(use_trash: bool) -> Self {
        if use_trash {
            Self::Trash
        } else {
            Self::Delete
        }
    }

    /// Apply this sink to `paths`.
    ///
    /// # Errors
    ///
    /// Returns the first [`DeleteError`]; remaining paths are not processed.
    pub fn execute(self, paths: &[PathBuf]) -> Result<SinkSummary, DeleteError> {
        match self {
            Self::Delete => remove_files(paths),
            Self::Trash => trash_files(paths),
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => f.write_str("permanent delete"),
            Self::Trash => f.write_str("trash"),
        }
    }
}

/// Move a single file to the system trash, returning its size.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if it cannot be inspected
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<u64, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_stat(path, e))?
        .len();

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
    Ok(size)
}

/// Permanently delete a single file, returning its size.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if it cannot be inspected
/// - `PermanentDeleteFailed` if the delete operation fails
pub fn permanent_delete(path: &Path) -> Result<u64, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_stat(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| {
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);
    Ok(size)
}

fn run_batch(
    paths: &[PathBuf],
    trashed: bool,
    op: impl Fn(&Path) -> Result<u64, DeleteError>,
) -> Result<SinkSummary, DeleteError> {
    let mut summary = SinkSummary {
        trashed,
        ..SinkSummary::default()
    };

    for path in paths {
        summary.bytes += op(path)?;
        summary.files += 1;
    }

    log::debug!("{}", summary.summary());
    Ok(summary)
}

/// Permanently delete every path, in order.
///
/// # Errors
///
/// Aborts on the first failure and returns it.
pub fn remove_files(paths: &[PathBuf]) -> Result<SinkSummary, DeleteError> {
    run_batch(paths, false, permanent_delete)
}

/// Move every path to the trash, in order.
///
/// # Errors
///
/// Aborts on the first failure and returns it.
pub fn trash_files(paths: &[PathBuf]) -> Result<SinkSummary, DeleteError> {
    run_batch(paths, true, delete_to_trash)
}
