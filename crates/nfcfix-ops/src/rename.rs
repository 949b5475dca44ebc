//! Single-entry rename.

use std::fs;
use std::path::Path;

use crate::RenameError;
use crate::conflict::{name_is_listed, same_inode};

/// Rename one entry to an already resolved target.
///
/// An existing file at `target` is replaced, matching `rename(2)`; callers
/// that must not overwrite resolve the target first. When `target` is
/// another hard link to the source file, `rename(2)` succeeds without
/// touching either name, so the source link is removed explicitly.
pub fn rename_entry(source: &Path, target: &Path) -> Result<(), RenameError> {
    fs::rename(source, target).map_err(|e| RenameError::io(source, target, e))?;

    if same_inode(source, target) && name_is_listed(source) {
        fs::remove_file(source).map_err(|e| RenameError::io(source, target, e))?;
    }
    Ok(())
}
