//! Lifecycle controller: turns a command line into task runs and an exit code.
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use clap::error::ErrorKind;

use crate::backend::Backend;
use crate::cli::{Cli, GlobalOpts, LifecycleRequest, Mode};
use crate::config::Config;
use crate::error::{ConfigError, EXIT_OK, InstallerError};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{self, Log, Logger};
use crate::operations::{FileSystemOps, SystemFileSystemOps};
use crate::platform::Platform;
use crate::tasks::{self, Context};

/// Program name used when parsing arguments.
const BIN_NAME: &str = "mininet-install";

/// Base name of the log file under the cache directory.
const LOG_NAME: &str = "install";

/// Environment variable naming the source tree root.
pub const ROOT_ENV: &str = "MININET_ROOT";

/// Collaborators a run talks to.
pub struct Runtime {
    /// Runs external commands.
    pub executor: Arc<dyn Executor>,
    /// Filesystem queries and working-directory changes.
    pub fs_ops: Arc<dyn FileSystemOps>,
    /// Logger shared by every task of the run.
    pub log: Arc<Logger>,
    /// Value of [`ROOT_ENV`] at startup.
    pub env_root: Option<PathBuf>,
    /// Whether [`dispatch`] installs the global tracing subscriber.
    pub install_subscriber: bool,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("executor", &"<dyn Executor>")
            .field("fs_ops", &"<dyn FileSystemOps>")
            .field("log", &self.log)
            .field("env_root", &self.env_root)
            .field("install_subscriber", &self.install_subscriber)
            .finish()
    }
}

impl Runtime {
    /// The real host: system commands, real filesystem, file logging.
    #[must_use]
    pub fn system() -> Self {
        Self {
            executor: Arc::new(SystemExecutor),
            fs_ops: Arc::new(SystemFileSystemOps),
            log: Arc::new(Logger::new(LOG_NAME)),
            env_root: std::env::var_os(ROOT_ENV).map(PathBuf::from),
            install_subscriber: true,
        }
    }

    /// A runtime over the given collaborators with no log file, no
    /// subscriber, and no root from the environment.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>, fs_ops: Arc<dyn FileSystemOps>) -> Self {
        Self {
            executor,
            fs_ops,
            log: Arc::new(Logger::with_log_file(None)),
            env_root: None,
            install_subscriber: false,
        }
    }
}

/// Parse `args` (without the program name), run the requested tasks, and
/// return the process exit code.
///
/// Help and unknown flags print usage and return 2; `--version` returns 0.
pub fn dispatch<I, T>(args: I, runtime: &Runtime) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let argv = std::iter::once(OsString::from(BIN_NAME)).chain(args.into_iter().map(Into::into));
    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(e) => return usage(&e),
    };

    if runtime.install_subscriber {
        logging::init_subscriber(cli.global.verbose, LOG_NAME);
    }

    let request = cli.tasks.request();
    match run(&cli.global, &request, runtime) {
        Ok(()) => EXIT_OK,
        Err(e) => {
            runtime.log.error(&e.to_string());
            e.exit_code()
        }
    }
}

fn usage(e: &clap::Error) -> u8 {
    // clap writes help and version to stdout and errors to stderr.
    e.print().ok();
    match e.kind() {
        ErrorKind::DisplayVersion => EXIT_OK,
        kind => InstallerError::Usage(kind.to_string()).exit_code(),
    }
}

/// Detect the platform, load the manifest, and run `request` in order.
///
/// Stops at the first failing task; tasks that completed stay applied.
///
/// # Errors
///
/// Returns the first platform, configuration, capability, or task error.
pub fn run(
    global: &GlobalOpts,
    request: &LifecycleRequest,
    runtime: &Runtime,
) -> Result<(), InstallerError> {
    let log = &runtime.log;

    log.stage("Detecting platform");
    let platform = Platform::detect(runtime.executor.as_ref())?;
    let backend = Backend::select(&platform)?;
    log.info(&format!("platform: {platform}"));
    log.debug(&format!(
        "package manager: {}, elevation: {}",
        backend.manager,
        backend.elevation.program().unwrap_or("none")
    ));
    if let Some(tool) = backend.elevation.program()
        && !runtime.executor.which(tool)
    {
        log.warn(&format!("{tool} not found on PATH; elevated commands will fail"));
    }

    let root = resolve_root(global, runtime)?;
    log.info(&format!("source root: {}", root.display()));

    let config = Config::load(&root, &platform, global.config.as_deref())?;
    let warnings = config.validate(runtime.fs_ops.as_ref());
    if !warnings.is_empty() {
        log.warn(&format!(
            "found {} configuration warning(s):",
            warnings.len()
        ));
        for warning in &warnings {
            log.warn(&format!("  {warning}"));
        }
    }

    let ctx = Context::new(
        platform,
        backend,
        Arc::new(config),
        root,
        Arc::clone(log) as Arc<dyn Log>,
        Arc::clone(&runtime.executor),
    )
    .with_fs_ops(Arc::clone(&runtime.fs_ops))
    .with_dry_run(global.dry_run);

    if ctx.dry_run {
        log.info("dry run: no changes will be made");
    }
    if request.mode == Mode::Uninstall {
        log.debug("uninstall requested; other task flags are ignored");
    }

    let result = request
        .tasks
        .iter()
        .try_for_each(|id| tasks::execute(id.task(), &ctx).map(|_| ()));

    log.print_summary();
    result
}

/// A directory looks like the source tree if it has the top-level
/// `Makefile` and the `mininet` package.
fn is_source_root(fs: &dyn FileSystemOps, dir: &Path) -> bool {
    fs.exists(&dir.join("Makefile")) && fs.exists(&dir.join("mininet"))
}

/// `path` made absolute against the working directory, with `.` and `..`
/// folded away.
fn absolute(fs: &dyn FileSystemOps, path: &Path) -> Result<PathBuf, ConfigError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = fs.current_dir().map_err(|e| {
            ConfigError::RootNotFound(format!("cannot resolve {}: {e}", path.display()))
        })?;
        cwd.join(path)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Resolve the source tree root.
///
/// Tries, in order: `--root`, `$MININET_ROOT`, the directories above the
/// binary (`util/` or `target/release/`), and the current directory. The
/// result is always absolute.
///
/// # Errors
///
/// Returns [`ConfigError::RootNotFound`] if none of them qualifies or a
/// relative root cannot be resolved.
pub fn resolve_root(global: &GlobalOpts, runtime: &Runtime) -> Result<PathBuf, ConfigError> {
    let fs = runtime.fs_ops.as_ref();

    if let Some(root) = global.root.as_ref().or(runtime.env_root.as_ref()) {
        return absolute(fs, root);
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(parent) = exe.parent()
    {
        let candidates = [
            parent.join(".."),    // util/ → source root
            parent.join("../.."), // target/release/ → source root
        ];
        for candidate in &candidates {
            if is_source_root(fs, candidate) {
                return std::fs::canonicalize(candidate)
                    .map_err(|e| ConfigError::RootNotFound(e.to_string()));
            }
        }
    }

    if let Ok(cwd) = fs.current_dir()
        && is_source_root(fs, &cwd)
    {
        return Ok(cwd);
    }

    Err(ConfigError::RootNotFound(format!(
        "use --root or set {ROOT_ENV}"
    )))
}
