//! Resumable duplicate scan.
//!
//! # Overview
//!
//! [`Scanner::scan`] runs the whole pipeline for one root:
//!
//! 1. Enumerate every regular file under the root (checkpoint files excluded).
//! 2. When resuming, prune checkpoint rows for vanished files and load the rest.
//! 3. For each file: stat it, report progress, apply the filter policy, then
//!    either reuse a trusted checkpoint fingerprint or hash the file and
//!    upsert the result immediately.
//! 4. Group records by fingerprint and keep groups of two or more.
//! 5. Optionally confirm each group byte for byte.
//!
//! Interruption is cooperative: the shutdown flag is checked between files,
//! never during a hash. On interruption or error every checkpoint row
//! already written stays valid, the partial grouping is discarded, and the
//! store and lock are released.
//!
//! # Example
//!
//! ```no_run
//! use dupfinder::config::ScanConfig;
//! use dupfinder::scanner::Scanner;
//!
//! let scanner = Scanner::new(ScanConfig::new("/data"));
//! let (groups, summary) = scanner.scan().unwrap();
//! println!("{} groups, {} files hashed", groups.len(), summary.files_hashed);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::checkpoint::{
    artefact_paths, CheckpointEntry, CheckpointError, CheckpointStore, ScanLock,
};
use crate::config::ScanConfig;
use crate::progress::ProgressCallback;

use super::filter::FilterPolicy;
use super::hasher::Hasher;
use super::walker::Walker;
use super::{system_time_to_secs, verify, FileRecord, HashError, ScanError};

/// Duplicate groups keyed by fingerprint, each with two or more records.
pub type DuplicateGroups = BTreeMap<String, Vec<FileRecord>>;

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan paused, progress saved")]
    Interrupted,

    /// Enumeration or stat failure.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A file could not be hashed.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// The checkpoint store failed.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// Counters describing one completed scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSummary {
    /// Regular files enumerated and visited
    pub files_visited: usize,
    /// Files left out by the filter policy
    pub files_skipped: usize,
    /// Files whose content was hashed this run
    pub files_hashed: usize,
    /// Files whose fingerprint came from the checkpoint
    pub checkpoint_hits: usize,
    /// Checkpoint rows removed because their file disappeared
    pub checkpoint_pruned: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Files across all duplicate groups
    pub duplicate_files: usize,
    /// Bytes freed by keeping one file per group
    pub reclaimable_bytes: u64,
    /// Wall-clock time of the scan
    pub duration: Duration,
}

impl ScanSummary {
    fn record_groups(&mut self, groups: &DuplicateGroups) {
        self.duplicate_groups = groups.len();
        self.duplicate_files = groups.values().map(Vec::len).sum();
        self.reclaimable_bytes = groups
            .values()
            .map(|files| {
                let size = files.first().map_or(0, |f| f.size);
                size * (files.len() as u64 - 1)
            })
            .sum();
    }

    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize::b(self.reclaimable_bytes).to_string()
    }
}

/// Checkpoint-backed duplicate scanner for one root.
pub struct Scanner {
    config: ScanConfig,
    hasher: Hasher,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .field("hasher", &self.hasher)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl Scanner {
    /// Create a scanner for `config`.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            hasher: Hasher::new(),
            shutdown_flag: None,
            progress: None,
        }
    }

    /// Use a custom hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Hasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Set the shutdown flag checked between files.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// The configuration this scanner runs with.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Run the scan.
    ///
    /// # Errors
    ///
    /// - [`FinderError::Interrupted`] if the shutdown flag was raised
    /// - [`FinderError::Scan`] for a missing root or enumeration/stat failure
    /// - [`FinderError::Hash`] if a file cannot be read
    /// - [`FinderError::Checkpoint`] if the store fails or the root is locked
    pub fn scan(&self) -> Result<(DuplicateGroups, ScanSummary), FinderError> {
        let result = self.scan_locked();

        match &result {
            Ok((_, summary)) => log::info!(
                "Scan complete: {} files visited, {} hashed, {} from checkpoint, {} duplicate group(s)",
                summary.files_visited,
                summary.files_hashed,
                summary.checkpoint_hits,
                summary.duplicate_groups
            ),
            Err(FinderError::Interrupted) => {
                log::info!("Scan interrupted. Progress has been saved to checkpoint.");
            }
            Err(e) => log::error!("Scan of {} failed: {}", self.config.root_dir().display(), e),
        }

        result
    }

    fn scan_locked(&self) -> Result<(DuplicateGroups, ScanSummary), FinderError> {
        let start = Instant::now();
        let root = std::path::absolute(self.config.root_dir())
            .map_err(|e| ScanError::from_io(self.config.root_dir().to_path_buf(), e))?;

        let walker = Walker::new(&root)
            .skip_hidden(self.config.skip_hidden())
            .exclude(artefact_paths(&root));
        walker.validate_root()?;

        log::info!(
            "Scanning {} (resume: {})",
            root.display(),
            self.config.resume()
        );

        // Declaration order matters: the store closes before the lock is released.
        let _lock = ScanLock::acquire(&root)?;
        let store = CheckpointStore::open(&root)?;

        let (groups, mut summary) = self.scan_with_store(&walker, &store)?;
        summary.duration = start.elapsed();
        Ok((groups, summary))
    }

    fn collect_paths(&self, walker: &Walker) -> Result<Vec<PathBuf>, FinderError> {
        let mut paths = Vec::new();
        for entry in walker.walk() {
            if self.is_shutdown_requested() {
                return Err(FinderError::Interrupted);
            }
            paths.push(entry?);
        }
        Ok(paths)
    }

    fn scan_with_store(
        &self,
        walker: &Walker,
        store: &CheckpointStore,
    ) -> Result<(DuplicateGroups, ScanSummary), FinderError> {
        let mut summary = ScanSummary::default();
        let paths = self.collect_paths(walker)?;
        log::debug!("Enumerated {} file(s)", paths.len());

        let cached: HashMap<PathBuf, CheckpointEntry> = if self.config.resume() {
            let existing: HashSet<PathBuf> = paths.iter().cloned().collect();
            summary.checkpoint_pruned = store.prune_missing(&existing)?;
            store.load_all()?
        } else {
            HashMap::new()
        };

        let policy = FilterPolicy::from_config(&self.config);
        let mut by_fingerprint: HashMap<String, Vec<FileRecord>> = HashMap::new();

        if let Some(cb) = &self.progress {
            cb.on_phase_start("scan", paths.len());
        }

        for (index, path) in paths.into_iter().enumerate() {
            if self.is_shutdown_requested() {
                return Err(FinderError::Interrupted);
            }

            let metadata =
                std::fs::metadata(&path).map_err(|e| ScanError::from_io(path.clone(), e))?;
            let modified = metadata
                .modified()
                .map_err(|e| ScanError::from_io(path.clone(), e))?;
            let size = metadata.len();

            summary.files_visited += 1;
            if let Some(cb) = &self.progress {
                cb.on_progress(index + 1, &path);
            }

            if policy.should_skip(&path, size) {
                log::trace!("Filtered out: {}", path.display());
                summary.files_skipped += 1;
                continue;
            }

            let fingerprint =
                self.fingerprint_for(&path, size, modified, &cached, store, &mut summary)?;

            by_fingerprint
                .entry(fingerprint.clone())
                .or_default()
                .push(FileRecord::new(path, size, modified, fingerprint));
        }

        if let Some(cb) = &self.progress {
            cb.on_phase_end("scan");
        }

        let mut groups: DuplicateGroups = by_fingerprint
            .into_iter()
            .filter(|(_, files)| files.len() >= 2)
            .collect();

        if self.config.verify() && !groups.is_empty() {
            log::debug!("Verifying {} group(s) byte for byte", groups.len());
            groups = verify::split_identical(groups, self.shutdown_flag.as_deref())?;
        }

        summary.record_groups(&groups);
        Ok((groups, summary))
    }

    /// Reuse a trusted checkpoint fingerprint or hash and persist a new one.
    fn fingerprint_for(
        &self,
        path: &Path,
        size: u64,
        modified: std::time::SystemTime,
        cached: &HashMap<PathBuf, CheckpointEntry>,
        store: &CheckpointStore,
        summary: &mut ScanSummary,
    ) -> Result<String, FinderError> {
        let modified_secs = system_time_to_secs(modified);

        if let Some(entry) = cached.get(path) {
            if entry.is_valid_for(size, modified_secs) {
                log::trace!("Checkpoint hit: {}", path.display());
                summary.checkpoint_hits += 1;
                return Ok(entry.fingerprint.clone());
            }
            log::debug!("Checkpoint stale, rehashing: {}", path.display());
        }

        let fingerprint = self.hasher.full_hash(path)?;
        store.upsert(&CheckpointEntry::new(
            path.to_path_buf(),
            fingerprint.clone(),
            size,
            modified_secs,
        ))?;
        summary.files_hashed += 1;
        Ok(fingerprint)
    }
}

/// Scan `config.root_dir()` and return duplicate groups.
///
/// `on_progress` receives one event per visited file.
///
/// # Errors
///
/// See [`Scanner::scan`].
pub fn find_all_duplicate_files(
    config: &ScanConfig,
    on_progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<DuplicateGroups, FinderError> {
    let mut scanner = Scanner::new(config.clone());
    if let Some(cb) = on_progress {
        scanner = scanner.with_progress_callback(cb);
    }
    scanner.scan().map(|(groups, _)| groups)
}
