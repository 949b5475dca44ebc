//! Rename plan types.

use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::analysis::NameAnalysis;

/// BLAKE3 content hash recorded in the backup ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Type of entry a plan item renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl ItemKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, ItemKind::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, ItemKind::File)
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// A pending rename of one entry to its canonical name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanItem {
    /// Absolute path of the entry at collection time.
    pub path: PathBuf,
    /// Current name on disk.
    pub old_name: CompactString,
    /// Canonical name the entry will be renamed to.
    pub new_name: CompactString,
    /// Whether this is a file or a directory.
    pub kind: ItemKind,
    /// Analysis that produced this item.
    pub analysis: NameAnalysis,
}

impl PlanItem {
    /// Create a plan item from an entry path and the analysis of its name.
    pub fn new(path: impl Into<PathBuf>, kind: ItemKind, analysis: NameAnalysis) -> Self {
        Self {
            path: path.into(),
            old_name: CompactString::new(&analysis.original),
            new_name: CompactString::new(&analysis.canonical),
            kind,
            analysis,
        }
    }

    /// Number of path components, used to order directory renames.
    pub fn depth(&self) -> usize {
        self.path.components().count()
    }

    /// Directory containing the entry.
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// Path the entry would have under its canonical name.
    pub fn target_path(&self) -> PathBuf {
        self.parent().join(self.new_name.as_str())
    }
}

/// Ordered list of pending renames, in collection order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    items: Vec<PlanItem>,
}

impl Plan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item.
    pub fn push(&mut self, item: PlanItem) {
        self.items.push(item);
    }

    /// All items in collection order.
    pub fn items(&self) -> &[PlanItem] {
        &self.items
    }

    /// File items in collection order.
    pub fn files(&self) -> impl Iterator<Item = &PlanItem> {
        self.items.iter().filter(|i| i.kind.is_file())
    }

    /// Directory items in collection order.
    pub fn directories(&self) -> impl Iterator<Item = &PlanItem> {
        self.items.iter().filter(|i| i.kind.is_dir())
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing needs renaming.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the plan, yielding its items.
    pub fn into_items(self) -> Vec<PlanItem> {
        self.items
    }
}

impl FromIterator<PlanItem> for Plan {
    fn from_iter<T: IntoIterator<Item = PlanItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
