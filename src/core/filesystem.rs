//! Project filesystem abstraction.
//!
//! Every path a build rule stores is relative to the root of the filesystem
//! it belongs to. Two filesystems are the same when their roots are equal.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::fs::{ensure_dir, relative_path, remove_file_if_exists};

/// A build root that relative paths are resolved against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectFilesystem {
    root: PathBuf,
}

impl ProjectFilesystem {
    /// Create a filesystem rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ProjectFilesystem { root: root.into() }
    }

    /// The root directory.
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Resolve a root-relative path to an absolute one.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Express `path` relative to the root.
    pub fn relativize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            relative_path(&self.root, path)
        } else {
            path.to_path_buf()
        }
    }

    /// Whether `path` lies under the root.
    pub fn contains(&self, path: &Path) -> bool {
        !path.is_absolute() || path.starts_with(&self.root)
    }

    /// Create a root-relative directory and its parents.
    pub fn mkdirs(&self, path: &Path) -> Result<()> {
        ensure_dir(&self.resolve(path))
    }

    /// Delete a root-relative file if present.
    pub fn delete_file_if_exists(&self, path: &Path) -> Result<()> {
        remove_file_if_exists(&self.resolve(path))
    }
}

impl fmt::Display for ProjectFilesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root.display())
    }
}
