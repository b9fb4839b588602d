//! Byte-for-byte confirmation of fingerprint groups.
//!
//! Fingerprint equality is normally trusted as content equality. With
//! verification enabled, each group is split into classes of files whose
//! bytes are actually identical. The first class keeps the group's
//! fingerprint as its key; further classes (only possible on a hash
//! collision) are keyed `<fingerprint>-2`, `<fingerprint>-3`, ... Classes
//! with a single member are dropped.
//!
//! The shutdown flag is checked before every comparison, so a long pass
//! over large groups stops promptly on the first Ctrl+C.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use super::finder::{DuplicateGroups, FinderError};
use super::{FileRecord, HashError};

const CHUNK_SIZE: usize = 64 * 1024;

/// Compare two files byte by byte.
///
/// # Errors
///
/// Propagates any open or read failure.
pub fn files_identical(a: &Path, b: &Path) -> Result<bool, HashError> {
    let open = |p: &Path| {
        File::open(p)
            .map(|f| BufReader::with_capacity(CHUNK_SIZE, f))
            .map_err(|e| HashError::from_io(p.to_path_buf(), e))
    };
    let mut reader_a = open(a)?;
    let mut reader_b = open(b)?;

    let mut buf_a = vec![0u8; CHUNK_SIZE];
    let mut buf_b = vec![0u8; CHUNK_SIZE];

    loop {
        let n_a = read_full(&mut reader_a, &mut buf_a)
            .map_err(|e| HashError::from_io(a.to_path_buf(), e))?;
        let n_b = read_full(&mut reader_b, &mut buf_b)
            .map_err(|e| HashError::from_io(b.to_path_buf(), e))?;

        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as possible, returning bytes read (short only at EOF).
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Split one group into byte-identical classes, preserving input order.
fn split_group(
    files: Vec<FileRecord>,
    shutdown: Option<&AtomicBool>,
) -> Result<Vec<Vec<FileRecord>>, FinderError> {
    let mut classes: Vec<Vec<FileRecord>> = Vec::new();

    'files: for file in files {
        for class in &mut classes {
            if shutdown.is_some_and(|f| f.load(Ordering::SeqCst)) {
                return Err(FinderError::Interrupted);
            }
            let representative = &class[0];
            if representative.size == file.size
                && files_identical(&representative.path, &file.path)?
            {
                class.push(file);
                continue 'files;
            }
        }
        classes.push(vec![file]);
    }

    Ok(classes)
}

/// Split every group into byte-identical classes with at least two members.
///
/// # Errors
///
/// - [`FinderError::Interrupted`] if `shutdown` is raised between comparisons
/// - [`FinderError::Hash`] for the first read failure
pub fn split_identical(
    groups: DuplicateGroups,
    shutdown: Option<&AtomicBool>,
) -> Result<DuplicateGroups, FinderError> {
    let mut verified = DuplicateGroups::new();

    for (fingerprint, files) in groups {
        let classes = split_group(files, shutdown)?;
        if classes.len() > 1 {
            log::warn!(
                "Fingerprint {} covers {} distinct contents",
                fingerprint,
                classes.len()
            );
        }

        for (index, class) in classes
            .into_iter()
            .filter(|c| c.len() >= 2)
            .enumerate()
        {
            let key = if index == 0 {
                fingerprint.clone()
            } else {
                format!("{}-{}", fingerprint, index + 1)
            };
            verified.insert(key, class);
        }
    }

    Ok(verified)
}
