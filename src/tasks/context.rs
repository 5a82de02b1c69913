//! State shared by every task of a run.
use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::Backend;
use crate::config::Config;
use crate::exec::Executor;
use crate::logging::Log;
use crate::operations::{FileSystemOps, SystemFileSystemOps};
use crate::platform::Platform;

/// Everything a task needs to compute and run its actions.
pub struct Context {
    /// Host family and release.
    pub platform: Platform,
    /// Package-management backend bound to [`Context::platform`].
    pub backend: Backend,
    /// Manifest loaded for this platform.
    pub config: Arc<Config>,
    /// Root of the source tree being installed.
    pub root: PathBuf,
    /// Where progress and task outcomes are reported.
    pub log: Arc<dyn Log>,
    /// Runs every collaborator command.
    pub executor: Arc<dyn Executor>,
    /// Existence checks and working-directory changes.
    pub fs_ops: Arc<dyn FileSystemOps>,
    /// Whether to log mutating actions instead of running them.
    pub dry_run: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("platform", &self.platform)
            .field("backend", &self.backend)
            .field("config", &"<Config>")
            .field("root", &self.root)
            .field("log", &"<dyn Log>")
            .field("executor", &"<dyn Executor>")
            .field("fs_ops", &"<dyn FileSystemOps>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Context {
    /// A context on the real filesystem, not in dry-run mode.
    #[must_use]
    pub fn new(
        platform: Platform,
        backend: Backend,
        config: Arc<Config>,
        root: PathBuf,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            platform,
            backend,
            config,
            root,
            log,
            executor,
            fs_ops: Arc::new(SystemFileSystemOps),
            dry_run: false,
        }
    }

    /// Replace the filesystem abstraction.
    #[must_use]
    pub fn with_fs_ops(mut self, fs_ops: Arc<dyn FileSystemOps>) -> Self {
        self.fs_ops = fs_ops;
        self
    }

    /// Print mutating commands instead of running them.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
