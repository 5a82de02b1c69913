//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that tasks can be unit-tested
//! without touching the real filesystem or the process working directory.
//! Production code uses [`SystemFileSystemOps`].

use std::path::{Path, PathBuf};

/// Abstraction over the filesystem queries and working-directory changes
/// used by tasks.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystemOps: Send + Sync {
    /// Returns `true` if `path` exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Returns the process working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory is unreadable or was removed.
    fn current_dir(&self) -> std::io::Result<PathBuf>;

    /// Change the process working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not exist or is not a directory.
    fn set_current_dir(&self, path: &Path) -> std::io::Result<()>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn current_dir(&self) -> std::io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn set_current_dir(&self, path: &Path) -> std::io::Result<()> {
        std::env::set_current_dir(path)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn system_exists_reports_real_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("present");
        std::fs::write(&file, "").unwrap();
        assert!(SystemFileSystemOps.exists(&file));
        assert!(!SystemFileSystemOps.exists(&dir.path().join("absent")));
    }

    #[test]
    fn system_current_dir_is_readable() {
        assert!(SystemFileSystemOps.current_dir().is_ok());
    }

    #[test]
    fn system_set_current_dir_rejects_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(SystemFileSystemOps.set_current_dir(&missing).is_err());
    }
}
