//! LocalCacheTier: text content on local disk.
//!
//! Layout under the working root:
//! ```text
//! {root}/
//! └── storage/
//!     ├── books/
//!     │   └── 123.json
//!     └── users/
//!         └── alice/
//!             └── bookshelf.json
//! ```
//!
//! Writes truncate and overwrite in place. There is no locking and no
//! temp-file rename, so concurrent writers to one path race at the
//! filesystem and a crash mid-write can leave partial content.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::error::{Result, StorageError};

/// Reads and writes cached files at absolute paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCacheTier;

impl LocalCacheTier {
    /// Full text of the file, or `None` if it does not exist.
    ///
    /// An existing empty file yields `Some("")`.
    pub fn read(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            // a file sitting where a parent directory belongs is ENOTDIR, not NotFound
            Err(e) if e.kind() == ErrorKind::NotFound || !path.exists() => Ok(None),
            Err(e) => Err(StorageError::io("read", path)(e)),
        }
    }

    /// Create parent directories and the file as needed, then replace its
    /// contents with `content`.
    pub fn write(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.ensure_dir(parent)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(StorageError::io("open", path))?;
        file.write_all(content.as_bytes())
            .map_err(StorageError::io("write", path))?;

        Ok(())
    }

    /// Create `dir` and its parents if missing.
    pub fn ensure_dir(&self, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            fs::create_dir_all(dir).map_err(StorageError::io("create directory", dir))?;
        }
        Ok(())
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_is_none() {
        let temp = TempDir::new().unwrap();
        let tier = LocalCacheTier;
        assert_eq!(tier.read(&temp.path().join("nope.json")).unwrap(), None);
    }

    #[test]
    fn test_write_creates_parents() {
        let temp = TempDir::new().unwrap();
        let tier = LocalCacheTier;
        let path = temp.path().join("a/b/c.json");

        tier.write(&path, "x").unwrap();

        assert!(tier.exists(&path));
        assert_eq!(tier.read(&path).unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_write_overwrites_entire_content() {
        let temp = TempDir::new().unwrap();
        let tier = LocalCacheTier;
        let path = temp.path().join("item.json");

        tier.write(&path, "a much longer first version").unwrap();
        tier.write(&path, "short").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn test_empty_file_reads_as_empty_string() {
        let temp = TempDir::new().unwrap();
        let tier = LocalCacheTier;
        let path = temp.path().join("empty.json");
        fs::write(&path, "").unwrap();

        assert_eq!(tier.read(&path).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_write_under_a_file_is_error() {
        let temp = TempDir::new().unwrap();
        let tier = LocalCacheTier;
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "i am a file").unwrap();

        let err = tier.write(&blocker.join("child.json"), "x").unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
        assert!(err.to_string().contains("blocker"));
    }

    #[test]
    fn test_read_below_a_file_is_none() {
        let temp = TempDir::new().unwrap();
        let tier = LocalCacheTier;
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        assert_eq!(tier.read(&blocker.join("child.json")).unwrap(), None);
    }

    #[test]
    fn test_read_directory_is_error() {
        let temp = TempDir::new().unwrap();
        let tier = LocalCacheTier;
        assert!(tier.read(temp.path()).is_err());
        assert!(!tier.exists(temp.path()));
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let tier = LocalCacheTier;
        let dir = temp.path().join("storage");

        tier.ensure_dir(&dir).unwrap();
        tier.ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }
}
