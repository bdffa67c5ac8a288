//! Storage backend seam and the local-disk implementation.

use std::fs;
use std::path::PathBuf;

use log::warn;

/// Contract the engine consumes for persisting internalized assets.
///
/// Write failures are reported through the `bool` returns rather than
/// errors; the engine converts them into its own fallback behavior.
pub trait Storage {
    /// Whether content already exists at the storage-relative path.
    fn exists(&self, relative: &str) -> bool;

    /// Write bytes at the storage-relative path, returning `false` on any
    /// failure.
    fn put(&self, relative: &str, contents: &[u8]) -> bool;

    /// Absolute public URL serving the storage-relative path.
    fn url(&self, relative: &str) -> String;

    /// Absolute local filesystem path backing the storage-relative path.
    fn path(&self, relative: &str) -> PathBuf;

    /// Remove a directory tree, returning `false` on failure. Removing an
    /// absent directory succeeds.
    fn delete_directory(&self, relative: &str) -> bool;

    /// Create a directory tree, returning `false` on failure.
    fn make_directory(&self, relative: &str) -> bool;
}

/// Local filesystem disk rooted at a directory and served from a base URL.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
    base_url: String,
}

impl DiskStorage {
    /// Create a disk over `root`, publicly reachable under `base_url`.
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Public base URL of the disk, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Storage for DiskStorage {
    fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    fn put(&self, relative: &str, contents: &[u8]) -> bool {
        let destination = self.path(relative);
        if let Some(parent) = destination.parent()
            && let Err(err) = fs::create_dir_all(parent)
        {
            warn!("failed to create {}: {err}", parent.display());
            return false;
        }
        match fs::write(&destination, contents) {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to write {}: {err}", destination.display());
                false
            }
        }
    }

    fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url, relative.trim_start_matches('/'))
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative.trim_start_matches('/'))
    }

    fn delete_directory(&self, relative: &str) -> bool {
        let target = self.path(relative);
        if !target.exists() {
            return true;
        }
        match fs::remove_dir_all(&target) {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to delete {}: {err}", target.display());
                false
            }
        }
    }

    fn make_directory(&self, relative: &str) -> bool {
        let target = self.path(relative);
        match fs::create_dir_all(&target) {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to create {}: {err}", target.display());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn put_creates_parent_directories_and_exists_sees_it() {
        let dir = tempdir().unwrap();
        let disk = DiskStorage::new(dir.path(), "http://assets.test/storage");

        assert!(!disk.exists("internalized/cdn/lib.js"));
        assert!(disk.put("internalized/cdn/lib.js", b"run();"));
        assert!(disk.exists("internalized/cdn/lib.js"));
        assert_eq!(fs::read(disk.path("internalized/cdn/lib.js")).unwrap(), b"run();");
    }

    #[test]
    fn put_reports_failure_instead_of_panicking() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("occupied"), b"file").unwrap();
        let disk = DiskStorage::new(dir.path().join("occupied"), "http://assets.test");

        assert!(!disk.put("internalized/lib.js", b"run();"));
    }

    #[test]
    fn urls_join_without_duplicate_separators() {
        let disk = DiskStorage::new("/srv/disk", "http://assets.test/storage/");
        assert_eq!(
            disk.url("/internalized/lib.js"),
            "http://assets.test/storage/internalized/lib.js"
        );
        assert_eq!(disk.base_url(), "http://assets.test/storage");
    }

    #[test]
    fn directory_lifecycle_round_trips() {
        let dir = tempdir().unwrap();
        let disk = DiskStorage::new(dir.path(), "http://assets.test");

        assert!(disk.make_directory("internalized"));
        assert!(disk.exists("internalized"));
        assert!(disk.delete_directory("internalized"));
        assert!(!disk.exists("internalized"));
        // deleting an absent tree is a success
        assert!(disk.delete_directory("internalized"));
    }
}
