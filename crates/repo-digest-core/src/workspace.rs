//! Workspace
//!
//! Scoped temporary directory holding one cloned repository. The directory is
//! removed when the `Workspace` is dropped, whether it was allocated here or
//! supplied by the caller.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::Result;

const TEMP_PREFIX: &str = "repo-digest-";

enum Backing {
    /// Freshly allocated, uniquely named directory
    Allocated(TempDir),
    /// Caller-supplied path (may not exist until the clone creates it)
    Supplied(PathBuf),
}

/// Exclusive owner of the analysis directory
pub struct Workspace {
    backing: Backing,
}

impl Workspace {
    /// Allocate a fresh temporary directory
    pub fn allocate() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(TEMP_PREFIX).tempdir()?;
        debug!("Allocated workspace: {}", dir.path().display());
        Ok(Self {
            backing: Backing::Allocated(dir),
        })
    }

    /// Use a caller-supplied directory. It is removed on drop like an allocated one.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug!("Using supplied workspace: {}", path.display());
        Self {
            backing: Backing::Supplied(path),
        }
    }

    /// Allocate unless a path is supplied
    pub fn from_option(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self::at(path)),
            None => Self::allocate(),
        }
    }

    /// Workspace directory; every key downstream is relative to this path
    pub fn path(&self) -> &Path {
        match &self.backing {
            Backing::Allocated(dir) => dir.path(),
            Backing::Supplied(path) => path,
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let path = self.path().to_path_buf();
        if !path.exists() {
            return;
        }
        // TempDir's own drop runs afterwards and finds nothing left
        match fs::remove_dir_all(&path) {
            Ok(()) => debug!("Removed workspace: {}", path.display()),
            Err(e) => warn!("Failed to remove workspace {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_creates_unique_dirs() {
        let a = Workspace::allocate().unwrap();
        let b = Workspace::allocate().unwrap();

        assert!(a.path().is_dir());
        assert!(b.path().is_dir());
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_allocated_removed_on_drop() {
        let workspace = Workspace::allocate().unwrap();
        let path = workspace.path().to_path_buf();
        fs::create_dir_all(path.join("nested/dir")).unwrap();
        fs::write(path.join("nested/dir/file.txt"), "content").unwrap();

        drop(workspace);
        assert!(!path.exists());
    }

    #[test]
    fn test_supplied_removed_on_drop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clone");
        fs::create_dir_all(path.join("src")).unwrap();
        fs::write(path.join("src/lib.rs"), "fn main() {}").unwrap();

        let workspace = Workspace::at(&path);
        assert_eq!(workspace.path(), path);

        drop(workspace);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_supplied_dir_is_tolerated() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("never-created");

        let workspace = Workspace::at(&path);
        drop(workspace);
        assert!(!path.exists());
    }
}
