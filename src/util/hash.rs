//! Hashing utilities for rule keys.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Compute SHA256 hash of a file.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Accumulates named fields into a SHA256 key.
///
/// Every field is framed by its name and a length prefix so that adjacent
/// values cannot run together.
pub struct KeyHasher {
    hasher: Sha256,
}

impl Default for KeyHasher {
    fn default() -> Self {
        KeyHasher::new()
    }
}

impl KeyHasher {
    pub fn new() -> Self {
        KeyHasher {
            hasher: Sha256::new(),
        }
    }

    fn put_raw(&mut self, bytes: &[u8]) {
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }

    /// Add a single named value.
    pub fn field(&mut self, name: &str, value: &str) -> &mut Self {
        self.put_raw(name.as_bytes());
        self.put_raw(value.as_bytes());
        self
    }

    /// Add a named list; order matters.
    pub fn list<'a>(&mut self, name: &str, items: impl IntoIterator<Item = &'a str>) -> &mut Self {
        self.put_raw(name.as_bytes());
        let items: Vec<&str> = items.into_iter().collect();
        self.hasher.update((items.len() as u64).to_le_bytes());
        for item in items {
            self.put_raw(item.as_bytes());
        }
        self
    }

    /// Finalize as a lowercase hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sha256_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.o");
        std::fs::write(&path, "hello").unwrap();

        assert_eq!(
            sha256_file(&path).unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_key_hasher_is_deterministic() {
        let key = |contents: &str| {
            let mut hasher = KeyHasher::new();
            hasher.field("contents", contents).list("inputs", ["a.o", "b.o"]);
            hasher.finish()
        };

        assert_eq!(key("normal"), key("normal"));
        assert_ne!(key("normal"), key("thin"));
    }

    #[test]
    fn test_key_hasher_frames_fields() {
        let mut a = KeyHasher::new();
        a.list("inputs", ["ab", "c"]);
        let mut b = KeyHasher::new();
        b.list("inputs", ["a", "bc"]);
        assert_ne!(a.finish(), b.finish());
    }
}
