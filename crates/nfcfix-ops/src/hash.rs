//! Content hashing for ledger verification.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use blake3::Hasher;

use nfcfix_core::ContentHash;

/// Compute the full BLAKE3 hash of a file.
pub fn hash_file(path: &Path) -> std::io::Result<ContentHash> {
    let file = File::open(path)?;
    let mut hasher = Hasher::new();
    hasher.update_reader(BufReader::new(file))?;
    Ok(ContentHash::new(*hasher.finalize().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hash_matches_in_memory_hash() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.bin");
        fs::write(&path, b"hello nfc").unwrap();

        let hash = hash_file(&path).unwrap();
        assert_eq!(hash.0, *blake3::hash(b"hello nfc").as_bytes());
    }

    #[test]
    fn test_hash_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(hash_file(&temp.path().join("missing")).is_err());
    }
}
