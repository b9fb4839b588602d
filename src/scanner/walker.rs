//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for enumerating every regular
//! file beneath a root directory. Directories and symbolic links are never
//! yielded, and an explicit exclusion set keeps the scanner's own checkpoint
//! artefacts out of the results.
//!
//! Children are visited in file-name order so repeated walks of an unchanged
//! tree produce the same sequence.
//!
//! # Example
//!
//! ```no_run
//! use dupfinder::scanner::Walker;
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads")).skip_hidden(true);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::ScanError;

/// Recursive enumerator of regular files under a root.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Skip entries whose name starts with `.`
    skip_hidden: bool,
    /// Exact paths never to yield
    excluded: HashSet<PathBuf>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            skip_hidden: false,
            excluded: HashSet::new(),
        }
    }

    /// Skip hidden files and directories.
    #[must_use]
    pub fn skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Never yield any of these exact paths.
    #[must_use]
    pub fn exclude<I: IntoIterator<Item = PathBuf>>(mut self, paths: I) -> Self {
        self.excluded.extend(paths);
        self
    }

    /// Root directory being walked.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check that the root exists and is a directory.
    ///
    /// # Errors
    ///
    /// - [`ScanError::NotFound`] if the root does not exist
    /// - [`ScanError::NotADirectory`] if it is not a directory
    pub fn validate_root(&self) -> Result<(), ScanError> {
        let metadata = std::fs::metadata(&self.root)
            .map_err(|e| ScanError::from_io(self.root.clone(), e))?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(ScanError::NotADirectory(self.root.clone()))
        }
    }

    fn is_hidden(entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'))
    }

    /// Walk the tree, yielding regular file paths.
    ///
    /// Errors are yielded rather than swallowed; the caller decides whether
    /// an error aborts the walk.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        let skip_hidden = self.skip_hidden;

        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| !(skip_hidden && Self::is_hidden(e)))
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        if entry.file_type().is_symlink() {
                            log::trace!("Skipping symlink: {}", entry.path().display());
                        }
                        return None;
                    }
                    let path = entry.into_path();
                    if self.excluded.contains(&path) {
                        log::trace!("Skipping excluded path: {}", path.display());
                        return None;
                    }
                    Some(Ok(path))
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
                    Some(Err(ScanError::from_io(path, source)))
                }
            })
    }

    /// Collect every file path, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first enumeration error encountered.
    pub fn collect_paths(&self) -> Result<Vec<PathBuf>, ScanError> {
        self.validate_root()?;
        self.walk().collect()
    }
}
