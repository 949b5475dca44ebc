//! Run statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{NameAnalysis, ScriptTag};
use crate::plan::ItemKind;

/// Counters for one run.
///
/// Each stage returns its own value; the caller merges them with
/// [`RunStats::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Regular files visited.
    pub files_scanned: u64,
    /// Directories visited (the root is not counted).
    pub dirs_scanned: u64,
    /// Files whose name contains a non-ASCII codepoint.
    pub non_ascii_files: u64,
    /// Directories whose name contains a non-ASCII codepoint.
    pub non_ascii_dirs: u64,
    /// Entries added to the plan.
    pub needs_normalization: u64,
    /// Renames that completed.
    pub renamed_success: u64,
    /// Renames that failed.
    pub renamed_failed: u64,
    /// Renames redirected to a disambiguated name because the target existed.
    pub skipped_exists: u64,
    /// Entries or directories skipped during the walk.
    pub warnings: u64,
    /// Entries per detected script.
    pub by_script: BTreeMap<ScriptTag, u64>,
}

impl RunStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one visited entry and the analysis of its name.
    pub fn record_entry(&mut self, kind: ItemKind, analysis: &NameAnalysis) {
        match kind {
            ItemKind::File => {
                self.files_scanned += 1;
                if analysis.has_non_ascii {
                    self.non_ascii_files += 1;
                }
            }
            ItemKind::Directory => {
                self.dirs_scanned += 1;
                if analysis.has_non_ascii {
                    self.non_ascii_dirs += 1;
                }
            }
        }

        for script in &analysis.scripts {
            *self.by_script.entry(*script).or_insert(0) += 1;
        }

        if analysis.needs_normalization {
            self.needs_normalization += 1;
        }
    }

    /// Record a skipped entry.
    pub fn record_warning(&mut self) {
        self.warnings += 1;
    }

    /// Total entries visited.
    pub fn total_scanned(&self) -> u64 {
        self.files_scanned + self.dirs_scanned
    }

    /// Add every counter of `other` into `self`.
    pub fn merge(&mut self, other: &RunStats) {
        self.files_scanned += other.files_scanned;
        self.dirs_scanned += other.dirs_scanned;
        self.non_ascii_files += other.non_ascii_files;
        self.non_ascii_dirs += other.non_ascii_dirs;
        self.needs_normalization += other.needs_normalization;
        self.renamed_success += other.renamed_success;
        self.renamed_failed += other.renamed_failed;
        self.skipped_exists += other.skipped_exists;
        self.warnings += other.warnings;
        for (script, count) in &other.by_script {
            *self.by_script.entry(*script).or_insert(0) += count;
        }
    }
}
