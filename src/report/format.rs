//! Size and timestamp formatting for report lines.

use std::time::SystemTime;

use chrono::{DateTime, Local};

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Timestamp layout used on data lines.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Format a byte count as `{:.1}GB`, `{:.1}MB`, `{:.1}KB` or `{n}B`.
///
/// Thresholds are 1024-based.
///
/// ```
/// use dupfinder::report::format_size;
///
/// assert_eq!(format_size(512), "512B");
/// assert_eq!(format_size(1536), "1.5KB");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.0MB");
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.1}GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1}KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes}B")
    }
}

/// Format a modification time as local `YYYY-MM-DD HH:MM`.
#[must_use]
pub fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(TIME_FORMAT).to_string()
}
