//! Scanner module for directory traversal, filtering and content hashing.
//!
//! This module provides functionality for:
//! - Recursive enumeration of regular files under a root
//! - Extension and size filtering before hashing
//! - MD5 content fingerprints (streaming)
//! - The resumable, checkpoint-backed duplicate scan
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`filter`]: Extension/size filter policy
//! - [`hasher`]: Streaming MD5 file hashing
//! - [`finder`]: The scan loop, checkpoint reuse and grouping
//! - [`verify`]: Optional byte-for-byte confirmation of groups
//!
//! # Example
//!
//! ```no_run
//! use dupfinder::config::ScanConfig;
//! use dupfinder::scanner::find_all_duplicate_files;
//!
//! let config = ScanConfig::builder("/home/user/Downloads")
//!     .resume(true)
//!     .build()
//!     .unwrap();
//!
//! let groups = find_all_duplicate_files(&config, None).unwrap();
//! for (fingerprint, files) in &groups {
//!     println!("{fingerprint}: {} copies", files.len());
//! }
//! ```

pub mod filter;
pub mod finder;
pub mod hasher;
pub mod verify;
pub mod walker;

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

// Re-export main types
pub use filter::{should_skip, FilterPolicy};
pub use finder::{find_all_duplicate_files, DuplicateGroups, FinderError, ScanSummary, Scanner};
pub use hasher::{hash_file, Hasher};
pub use walker::Walker;

/// Snapshot of one file's state at scan time.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Hex-encoded content fingerprint
    pub fingerprint: String,
}

impl FileRecord {
    /// Create a new FileRecord.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime, fingerprint: String) -> Self {
        Self {
            path,
            size,
            modified,
            fingerprint,
        }
    }

    /// Modification time as fractional seconds since the Unix epoch.
    #[must_use]
    pub fn modified_secs(&self) -> f64 {
        system_time_to_secs(self.modified)
    }
}

/// Convert a `SystemTime` to fractional seconds since the Unix epoch.
///
/// Times before the epoch come out negative.
#[must_use]
pub fn system_time_to_secs(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }
}
