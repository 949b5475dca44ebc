//! Backup ledger of executed renames.
//!
//! The ledger is append-only: entries are staged before a rename, committed
//! once the rename succeeds, and written to disk once at the end of a run.
//! Reversing a run is a manual procedure driven by the written file.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use nfcfix_core::{ContentHash, RunStats};

/// Format version written into every ledger file.
pub const LEDGER_VERSION: &str = "1.0";

/// Prefix of ledger file names.
pub const LEDGER_PREFIX: &str = "nfc_backup_";

/// Attempts at finding an unused ledger file name within one second.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Errors that can occur while writing or reading a ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger file could not be created or written.
    #[error("Failed to write ledger {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger file could not be read.
    #[error("Failed to read ledger {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed.
    #[error("Ledger serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Every candidate file name was already taken.
    #[error("No unused ledger file name in {dir}")]
    NoFreeName { dir: PathBuf },
}

/// One executed rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Path before the rename.
    pub original_path: PathBuf,
    /// Path after the rename.
    pub new_path: PathBuf,
    /// When the rename was staged.
    pub timestamp: DateTime<Utc>,
    /// BLAKE3 hex digest of the file content; `None` for directories, links
    /// and unreadable files.
    pub file_hash: Option<String>,
}

/// An entry waiting for its rename to succeed.
#[derive(Debug)]
#[must_use = "a staged entry is only recorded once committed"]
pub struct StagedEntry(LedgerEntry);

impl StagedEntry {
    /// The entry that will be committed.
    pub fn entry(&self) -> &LedgerEntry {
        &self.0
    }
}

/// In-memory ledger for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupLedger {
    entries: Vec<LedgerEntry>,
}

impl BackupLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an entry for a rename that is about to happen.
    pub fn stage(
        &self,
        original_path: impl Into<PathBuf>,
        new_path: impl Into<PathBuf>,
        hash: Option<ContentHash>,
    ) -> StagedEntry {
        StagedEntry(LedgerEntry {
            original_path: original_path.into(),
            new_path: new_path.into(),
            timestamp: Utc::now(),
            file_hash: hash.map(|h| h.to_hex()),
        })
    }

    /// Record a staged entry after its rename succeeded.
    pub fn commit(&mut self, staged: StagedEntry) {
        self.entries.push(staged.0);
    }

    /// Committed entries, oldest first.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Get the number of committed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was committed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the ledger into `root` if it holds any entries.
    ///
    /// Returns the path of the written file, or `None` when there was
    /// nothing to write.
    pub fn finalize(&self, root: &Path, stats: &RunStats) -> Result<Option<PathBuf>, LedgerError> {
        self.finalize_at(root, stats, Utc::now())
    }

    /// Write the ledger as if the run ended at `created`.
    pub fn finalize_at(
        &self,
        root: &Path,
        stats: &RunStats,
        created: DateTime<Utc>,
    ) -> Result<Option<PathBuf>, LedgerError> {
        if self.entries.is_empty() {
            return Ok(None);
        }

        let document = LedgerDocument {
            version: LEDGER_VERSION.to_string(),
            created,
            directory: root.to_path_buf(),
            mappings: self.entries.clone(),
            stats: stats.clone(),
        };

        let bytes = serde_json::to_vec_pretty(&document)?;
        let (path, file) = create_ledger_file(root, created)?;
        if let Err(e) = write_ledger(BufWriter::new(file), &path, &bytes) {
            // Never leave a truncated ledger behind.
            let _ = std::fs::remove_file(&path);
            return Err(e);
        }

        Ok(Some(path))
    }
}

/// On-disk ledger format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerDocument {
    /// Format version.
    pub version: String,
    /// When the ledger was written.
    pub created: DateTime<Utc>,
    /// Root directory of the run.
    pub directory: PathBuf,
    /// Executed renames, in execution order.
    pub mappings: Vec<LedgerEntry>,
    /// Final statistics of the run.
    pub stats: RunStats,
}

impl LedgerDocument {
    /// Read a ledger file.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|source| LedgerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Ledger file name for a run ending at `created`.
pub fn ledger_file_name(created: DateTime<Utc>, attempt: u32) -> String {
    let stamp = created.format("%Y%m%d_%H%M%S");
    if attempt == 0 {
        format!("{LEDGER_PREFIX}{stamp}.json")
    } else {
        format!("{LEDGER_PREFIX}{stamp}_{attempt}.json")
    }
}

/// Write serialized ledger bytes, attributing failures to `path`.
fn write_ledger(mut writer: impl Write, path: &Path, bytes: &[u8]) -> Result<(), LedgerError> {
    writer
        .write_all(bytes)
        .and_then(|()| writer.flush())
        .map_err(|source| LedgerError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Create a new ledger file, never reusing an existing name.
fn create_ledger_file(root: &Path, created: DateTime<Utc>) -> Result<(PathBuf, File), LedgerError> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = root.join(ledger_file_name(created, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(LedgerError::Write { path, source }),
        }
    }

    Err(LedgerError::NoFreeName {
        dir: root.to_path_buf(),
    })
}
