//! Collection progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Progress information during a collection walk.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Number of files scanned so far.
    pub files_scanned: u64,
    /// Number of directories scanned so far.
    pub dirs_scanned: u64,
    /// Number of entries planned for renaming so far.
    pub planned: u64,
    /// Entry most recently visited.
    pub current_path: PathBuf,
    /// Number of warnings encountered.
    pub warnings_count: u64,
    /// Time elapsed since the walk started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            files_scanned: 0,
            dirs_scanned: 0,
            planned: 0,
            current_path: PathBuf::new(),
            warnings_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate scan rate in entries per second.
    pub fn entries_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.total_items() as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items scanned (files + dirs).
    pub fn total_items(&self) -> u64 {
        self.files_scanned + self.dirs_scanned
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Timing wrapper that turns run counters into progress snapshots.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(
        &self,
        stats: &nfcfix_core::RunStats,
        planned: usize,
        current_path: PathBuf,
    ) -> ScanProgress {
        ScanProgress {
            files_scanned: stats.files_scanned,
            dirs_scanned: stats.dirs_scanned,
            planned: planned as u64,
            current_path,
            warnings_count: stats.warnings,
            elapsed: self.elapsed(),
        }
    }
}
