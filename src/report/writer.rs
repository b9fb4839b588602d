//! Report rendering.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::scanner::{DuplicateGroups, FileRecord};

use super::format::{format_size, format_time};
use super::keep_rule::{sort_by_keep_rule, KeepRule};
use super::parser::Action;
use super::ReportError;

/// Render `groups` into `writer`, returning the number of groups written.
///
/// Groups appear in key order and are separated by a blank line. Within a
/// group, records are ordered by `keep_rule`; the first is marked `KEEP`,
/// the rest `REMOVE`. The header's size is the kept file's size.
///
/// A path that is not valid UTF-8 cannot be written back verbatim, so its
/// record is left out with a warning. A group left with fewer than two
/// records is left out entirely.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_report<W: Write>(
    groups: &DuplicateGroups,
    writer: &mut W,
    keep_rule: KeepRule,
) -> std::io::Result<usize> {
    let mut written = 0;

    for (fingerprint, files) in groups {
        let lines: Vec<(&FileRecord, &str)> = sort_by_keep_rule(files, keep_rule)
            .into_iter()
            .filter_map(|file| match file.path.to_str() {
                Some(path) => Some((file, path)),
                None => {
                    log::warn!(
                        "Leaving {} out of the report: path is not valid UTF-8",
                        file.path.display()
                    );
                    None
                }
            })
            .collect();
        if lines.len() < 2 {
            continue;
        }

        if written > 0 {
            writeln!(writer)?;
        }
        written += 1;

        writeln!(
            writer,
            "# [md5: {}] [size: {}] [{} files]",
            fingerprint,
            format_size(lines[0].0.size),
            lines.len()
        )?;

        for (index, (file, path)) in lines.iter().enumerate() {
            let action = if index == 0 {
                Action::Keep
            } else {
                Action::Remove
            };
            writeln!(writer, "{}\t{}\t{}", action, format_time(file.modified), path)?;
        }
    }

    Ok(written)
}

/// Write the report for `groups` to `output_path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the file cannot be created or written.
pub fn generate_report(
    groups: &DuplicateGroups,
    output_path: &Path,
    keep_rule: KeepRule,
) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: output_path.to_path_buf(),
        source,
    };

    let file = File::create(output_path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    let written = write_report(groups, &mut writer, keep_rule).map_err(io_err)?;
    writer.flush().map_err(io_err)?;

    log::info!(
        "Wrote report for {} group(s) to {}",
        written,
        output_path.display()
    );
    Ok(())
}
