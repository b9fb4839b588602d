//! Extension and size filter policy.
//!
//! Decides whether a discovered file is in scope for hashing. Rules are
//! evaluated in order and the first match wins:
//!
//! 1. extension in `ignore_extensions` => skip
//! 2. `only_extensions` set and extension not in it => skip
//! 3. size below `min_size` => skip
//! 4. size above `max_size` => skip
//!
//! Extensions are compared case-insensitively. A file with no extension has
//! the empty extension, which never matches an ignore entry and always fails
//! an `only_extensions` list.

use std::path::Path;

use crate::config::ScanConfig;

/// Precomputed filter derived from a [`ScanConfig`].
#[derive(Debug, Clone, Default)]
pub struct FilterPolicy {
    ignore_extensions: Option<Vec<String>>,
    only_extensions: Option<Vec<String>>,
    min_bytes: Option<u64>,
    max_bytes: Option<u64>,
}

impl FilterPolicy {
    /// Build the policy for a configuration.
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            ignore_extensions: config.ignore_extensions().map(<[String]>::to_vec),
            only_extensions: config.only_extensions().map(<[String]>::to_vec),
            min_bytes: config.min_size().map(|b| b.to_bytes()),
            max_bytes: config.max_size().map(|b| b.to_bytes()),
        }
    }

    /// True when no rule is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ignore_extensions.is_none()
            && self.only_extensions.is_none()
            && self.min_bytes.is_none()
            && self.max_bytes.is_none()
    }

    /// Whether `path` of `size` bytes should be left out of the scan.
    #[must_use]
    pub fn should_skip(&self, path: &Path, size: u64) -> bool {
        let ext = extension_of(path);

        if let Some(ignore) = &self.ignore_extensions {
            if ignore.iter().any(|e| *e == ext) {
                return true;
            }
        }

        if let Some(only) = &self.only_extensions {
            if !only.iter().any(|e| *e == ext) {
                return true;
            }
        }

        if self.min_bytes.is_some_and(|min| size < min) {
            return true;
        }

        self.max_bytes.is_some_and(|max| size > max)
    }
}

/// Check a single file against the filters in `config`.
#[must_use]
pub fn should_skip(path: &Path, size: u64, config: &ScanConfig) -> bool {
    FilterPolicy::from_config(config).should_skip(path, size)
}

/// Lowercased extension with its leading dot, or `""` if there is none.
fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
