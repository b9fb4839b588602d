//! MD5 file hasher with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing the content
//! fingerprint of a file. The whole file is always read; there is no
//! sampled or partial hashing, so equal fingerprints are treated as equal
//! content.
//!
//! Files are read in fixed-size chunks so memory use stays flat no matter
//! how large the file is.
//!
//! # Example
//!
//! ```no_run
//! use dupfinder::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let fingerprint = hasher.full_hash(Path::new("photo.jpg")).unwrap();
//! assert_eq!(fingerprint.len(), 32);
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use md5::{Digest, Md5};

use super::HashError;

/// Default read buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Length of a hex-encoded fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = 32;

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Create a hasher with a custom buffer size (minimum 1 byte).
    #[must_use]
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Hash the entire content of `path`, returning a lowercase hex digest.
    ///
    /// # Errors
    ///
    /// - [`HashError::NotFound`] if the file vanished
    /// - [`HashError::PermissionDenied`] if it cannot be read
    /// - [`HashError::Io`] for any other read failure
    pub fn full_hash(&self, path: &Path) -> Result<String, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
        self.hash_reader(file)
            .map_err(|e| HashError::from_io(path.to_path_buf(), e))
    }

    /// Hash everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Propagates any read error.
    pub fn hash_reader<R: Read>(&self, reader: R) -> std::io::Result<String> {
        let mut reader = BufReader::with_capacity(self.buffer_size, reader);
        let mut hasher = Md5::new();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Hash `path` with a default [`Hasher`].
///
/// # Errors
///
/// See [`Hasher::full_hash`].
pub fn hash_file(path: &Path) -> Result<String, HashError> {
    Hasher::new().full_hash(path)
}
