//! Keep-rule policy: which member of a duplicate group survives.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scanner::FileRecord;

/// Rule for ordering a group so the file to keep comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepRule {
    /// Earliest modification time first
    Oldest,
    /// Latest modification time first
    Newest,
    /// Shortest path (in characters) first
    ShortestPath,
    /// Input order, unchanged
    #[default]
    FirstFound,
}

impl KeepRule {
    /// All rules, in display order.
    pub const ALL: [Self; 4] = [
        Self::Oldest,
        Self::Newest,
        Self::ShortestPath,
        Self::FirstFound,
    ];

    /// Canonical name as used in settings files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Oldest => "oldest",
            Self::Newest => "newest",
            Self::ShortestPath => "shortest_path",
            Self::FirstFound => "first_found",
        }
    }
}

impl fmt::Display for KeepRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeepRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|rule| rule.as_str() == normalized)
            .ok_or_else(|| format!("unknown keep rule '{s}'"))
    }
}

/// Return the group's records ordered so that index 0 is the one to keep.
///
/// The sort is stable: ties keep their input order. The input is not modified.
#[must_use]
pub fn sort_by_keep_rule(files: &[FileRecord], rule: KeepRule) -> Vec<&FileRecord> {
    let mut sorted: Vec<&FileRecord> = files.iter().collect();
    match rule {
        KeepRule::Oldest => sorted.sort_by(|a, b| a.modified.cmp(&b.modified)),
        KeepRule::Newest => sorted.sort_by(|a, b| b.modified.cmp(&a.modified)),
        KeepRule::ShortestPath => sorted.sort_by_key(|f| path_len(f)),
        KeepRule::FirstFound => {}
    }
    sorted
}

/// Path length in characters, matching what a user sees in the report.
fn path_len(file: &FileRecord) -> usize {
    file.path.to_string_lossy().chars().count()
}
