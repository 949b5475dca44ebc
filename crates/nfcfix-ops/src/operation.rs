//! Rename errors and failure records.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while renaming a single plan item.
#[derive(Debug, Error)]
pub enum RenameError {
    /// Every disambiguated name up to the attempt cap is taken.
    #[error("No free name for {target} after {attempts} attempts")]
    NoFreeName { target: PathBuf, attempts: u32 },

    /// The filesystem rename failed.
    #[error("Rename failed: {source}")]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenameError {
    /// Create an I/O error with both paths attached.
    pub fn io(from: impl Into<PathBuf>, to: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            from: from.into(),
            to: to.into(),
            source,
        }
    }
}

/// A plan item that could not be renamed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameFailure {
    /// The path that was being renamed.
    pub path: PathBuf,
    /// Where it was going, if a target had been resolved.
    pub target: Option<PathBuf>,
    /// A human-readable error message.
    pub message: String,
}

impl RenameFailure {
    /// Create a new failure record.
    pub fn new(path: PathBuf, target: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path,
            target,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RenameFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}
