//! Scoped working-directory changes for build actions.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::operations::FileSystemOps;

/// Changes the process working directory for its lifetime.
///
/// The previous directory is captured before the change and restored when
/// the guard is dropped, whether the enclosing action returns normally,
/// fails, or unwinds.
pub struct WorkdirGuard<'a> {
    fs: &'a dyn FileSystemOps,
    previous: PathBuf,
}

impl std::fmt::Debug for WorkdirGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkdirGuard")
            .field("fs", &"<dyn FileSystemOps>")
            .field("previous", &self.previous)
            .finish()
    }
}

impl<'a> WorkdirGuard<'a> {
    /// Enter `dir`, remembering where we were.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be read or `dir`
    /// cannot be entered. The working directory is unchanged in both cases.
    pub fn enter(fs: &'a dyn FileSystemOps, dir: &Path) -> Result<Self> {
        let previous = fs
            .current_dir()
            .context("reading current working directory")?;
        fs.set_current_dir(dir)
            .with_context(|| format!("entering {}", dir.display()))?;
        Ok(Self { fs, previous })
    }
}

impl Drop for WorkdirGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.fs.set_current_dir(&self.previous) {
            tracing::warn!(
                "failed to restore working directory {}: {e}",
                self.previous.display()
            );
        }
    }
}
