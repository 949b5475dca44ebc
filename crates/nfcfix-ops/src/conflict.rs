//! Conflict detection and resolution for rename targets.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::RenameError;

/// Marker inserted between the stem and the counter of a disambiguated name.
pub const NFC_MARKER: &str = "_nfc";

/// Upper bound on disambiguation candidates tried for one item.
pub const MAX_DISAMBIGUATION_ATTEMPTS: u32 = 10_000;

/// A conflict detected while resolving a rename target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    /// The path being renamed.
    pub source: PathBuf,
    /// The canonical target that was already taken.
    pub destination: PathBuf,
    /// The kind of conflict.
    pub kind: ConflictKind,
}

impl Conflict {
    /// Create a new conflict.
    pub fn new(source: PathBuf, destination: PathBuf, kind: ConflictKind) -> Self {
        Self {
            source,
            destination,
            kind,
        }
    }
}

/// The kind of conflict encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// A file (or link) already exists at the destination.
    FileExists,
    /// A directory already exists at the destination.
    DirectoryExists,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileExists => write!(f, "File already exists"),
            Self::DirectoryExists => write!(f, "Directory already exists"),
        }
    }
}

/// How to resolve a taken target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConflictResolution {
    /// Pick the first free `{stem}_nfc{n}{.ext}` name.
    #[default]
    Disambiguate,
    /// Rename over the existing entry.
    Overwrite,
}

impl ConflictResolution {
    /// Resolution implied by the `force` option.
    pub fn from_force(force: bool) -> Self {
        if force { Self::Overwrite } else { Self::Disambiguate }
    }
}

/// Final destination chosen for one rename.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Path the entry will be renamed to.
    pub path: PathBuf,
    /// Conflict with the canonical target, if any.
    pub conflict: Option<Conflict>,
    /// Whether `path` is a disambiguated variant of the canonical target.
    pub disambiguated: bool,
}

/// Build the `counter`-th disambiguated variant of a name.
///
/// `"café.txt"` becomes `"café_nfc1.txt"`; names without an extension,
/// including dotfiles, get the marker appended.
pub fn disambiguated_name(name: &str, counter: u32) -> String {
    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}{NFC_MARKER}{counter}.{ext}"),
        None => format!("{stem}{NFC_MARKER}{counter}"),
    }
}

/// Choose the destination for renaming `source` to `target`.
///
/// `occupied` reports whether a path is taken. A target that is the source
/// entry itself (normalization-insensitive filesystems report the
/// decomposed and composed names as the same entry) is not a conflict.
pub fn resolve_target(
    source: &Path,
    target: PathBuf,
    resolution: ConflictResolution,
    occupied: impl Fn(&Path) -> bool,
) -> Result<ResolvedTarget, RenameError> {
    if !occupied(&target) || is_same_entry(source, &target) {
        return Ok(ResolvedTarget {
            path: target,
            conflict: None,
            disambiguated: false,
        });
    }

    let kind = if target.is_dir() {
        ConflictKind::DirectoryExists
    } else {
        ConflictKind::FileExists
    };
    let conflict = Conflict::new(source.to_path_buf(), target.clone(), kind);

    if resolution == ConflictResolution::Overwrite {
        return Ok(ResolvedTarget {
            path: target,
            conflict: Some(conflict),
            disambiguated: false,
        });
    }

    let parent = target.parent().unwrap_or(Path::new(""));
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    for counter in 1..=MAX_DISAMBIGUATION_ATTEMPTS {
        let candidate = parent.join(disambiguated_name(&name, counter));
        if !occupied(&candidate) {
            return Ok(ResolvedTarget {
                path: candidate,
                conflict: Some(conflict),
                disambiguated: true,
            });
        }
    }

    Err(RenameError::NoFreeName {
        target,
        attempts: MAX_DISAMBIGUATION_ATTEMPTS,
    })
}

/// Whether a path exists on disk, without following a final symlink.
pub fn path_occupied(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// Whether `target` names the very entry at `source`.
///
/// Normalization-insensitive filesystems resolve both spellings to one
/// entry, and only one of them is ever listed. Two listed names sharing an
/// inode are hard links and remain a conflict.
fn is_same_entry(source: &Path, target: &Path) -> bool {
    same_inode(source, target) && !name_is_listed(target)
}

#[cfg(unix)]
pub(crate) fn same_inode(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (std::fs::symlink_metadata(a), std::fs::symlink_metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
pub(crate) fn same_inode(_a: &Path, _b: &Path) -> bool {
    false
}

/// Whether the exact bytes of the final component appear in the parent's
/// listing. An unreadable parent counts as listed.
pub(crate) fn name_is_listed(path: &Path) -> bool {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return true;
    };
    match std::fs::read_dir(parent) {
        Ok(entries) => entries.flatten().any(|entry| entry.file_name() == name),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_disambiguated_name() {
        assert_eq!(disambiguated_name("caf\u{e9}.txt", 1), "caf\u{e9}_nfc1.txt");
        assert_eq!(disambiguated_name("archive.tar.gz", 2), "archive.tar_nfc2.gz");
        assert_eq!(disambiguated_name("\u{d55c}\u{ae00}", 3), "\u{d55c}\u{ae00}_nfc3");
        assert_eq!(disambiguated_name(".profile", 1), ".profile_nfc1");
    }

    #[test]
    fn test_free_target_is_used_directly() {
        let resolved = resolve_target(
            Path::new("/r/cafe\u{301}.txt"),
            PathBuf::from("/r/caf\u{e9}.txt"),
            ConflictResolution::Disambiguate,
            |_| false,
        )
        .unwrap();
        assert_eq!(resolved.path, PathBuf::from("/r/caf\u{e9}.txt"));
        assert!(resolved.conflict.is_none());
        assert!(!resolved.disambiguated);
    }

    #[test]
    fn test_counter_skips_taken_names() {
        let taken: HashSet<PathBuf> = [
            PathBuf::from("/r/caf\u{e9}.txt"),
            PathBuf::from("/r/caf\u{e9}_nfc1.txt"),
            PathBuf::from("/r/caf\u{e9}_nfc2.txt"),
        ]
        .into_iter()
        .collect();

        let resolved = resolve_target(
            Path::new("/r/cafe\u{301}.txt"),
            PathBuf::from("/r/caf\u{e9}.txt"),
            ConflictResolution::Disambiguate,
            |p| taken.contains(p),
        )
        .unwrap();
        assert_eq!(resolved.path, PathBuf::from("/r/caf\u{e9}_nfc3.txt"));
        assert!(resolved.disambiguated);
    }

    #[test]
    fn test_overwrite_keeps_canonical_target() {
        let resolved = resolve_target(
            Path::new("/r/cafe\u{301}.txt"),
            PathBuf::from("/r/caf\u{e9}.txt"),
            ConflictResolution::Overwrite,
            |_| true,
        )
        .unwrap();
        assert_eq!(resolved.path, PathBuf::from("/r/caf\u{e9}.txt"));
        assert!(resolved.conflict.is_some());
        assert!(!resolved.disambiguated);
    }

    #[test]
    fn test_disambiguation_is_bounded() {
        let err = resolve_target(
            Path::new("/r/cafe\u{301}"),
            PathBuf::from("/r/caf\u{e9}"),
            ConflictResolution::Disambiguate,
            |_| true,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RenameError::NoFreeName {
                attempts: MAX_DISAMBIGUATION_ATTEMPTS,
                ..
            }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_hard_links_are_not_the_same_entry() {
        let temp = tempfile::TempDir::new().unwrap();
        let composed = temp.path().join("caf\u{e9}.txt");
        let decomposed = temp.path().join("cafe\u{301}.txt");
        std::fs::write(&composed, "").unwrap();
        std::fs::hard_link(&composed, &decomposed).unwrap();

        assert!(same_inode(&decomposed, &composed));
        assert!(!is_same_entry(&decomposed, &composed));

        let resolved = resolve_target(
            &decomposed,
            composed.clone(),
            ConflictResolution::Disambiguate,
            path_occupied,
        )
        .unwrap();
        assert!(resolved.disambiguated);
        assert_eq!(resolved.path, temp.path().join("caf\u{e9}_nfc1.txt"));
    }

    #[test]
    fn test_resolution_from_force() {
        assert_eq!(ConflictResolution::from_force(true), ConflictResolution::Overwrite);
        assert_eq!(ConflictResolution::from_force(false), ConflictResolution::Disambiguate);
    }
}
