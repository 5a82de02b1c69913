// Shared helpers for integration tests.
//
// Provides a scripted BSD host that answers platform queries, records every
// command line, and tracks the little state the installer changes (core
// installed, host config present, checkouts, working directory) so a test can
// drive `dispatch` end to end without touching the real system.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use mininet_install::commands::{Runtime, dispatch};
use mininet_install::exec::{CommandError, ExecResult, Executor, command_line};
use mininet_install::operations::FileSystemOps;

/// FreeBSD loader configuration placed by the dependency task.
pub const LOADER_CONF: &str = "/boot/loader.conf.d/mininet.conf";

/// Kernel configuration dump of a VIMAGE kernel.
pub const VIMAGE_CONFTXT: &str = "machine\tamd64\ncpu\tHAMMER\noptions\tVIMAGE\n";

/// Kernel configuration dump of a GENERIC kernel without VIMAGE.
pub const GENERIC_CONFTXT: &str = "machine\tamd64\ncpu\tHAMMER\noptions\tSCHED_ULE\n";

#[derive(Debug)]
struct HostState {
    calls: Vec<String>,
    existing: HashSet<PathBuf>,
    cwd: PathBuf,
    core_installed: bool,
    build_dirs: Vec<PathBuf>,
}

/// A scripted host implementing both [`Executor`] and [`FileSystemOps`].
#[derive(Debug)]
pub struct FakeHost {
    uname_s: String,
    uname_r: String,
    conftxt: Option<String>,
    failures: Vec<(String, i32)>,
    state: Mutex<HostState>,
}

impl FakeHost {
    fn new(uname_s: &str, uname_r: &str, conftxt: Option<&str>) -> Self {
        Self {
            uname_s: uname_s.to_string(),
            uname_r: uname_r.to_string(),
            conftxt: conftxt.map(str::to_string),
            failures: Vec::new(),
            state: Mutex::new(HostState {
                calls: Vec::new(),
                existing: HashSet::new(),
                cwd: PathBuf::from("/home/user"),
                core_installed: false,
                build_dirs: Vec::new(),
            }),
        }
    }

    /// FreeBSD 14.1 with a VIMAGE kernel.
    pub fn freebsd() -> Self {
        Self::new("FreeBSD", "14.1-RELEASE", Some(VIMAGE_CONFTXT))
    }

    /// FreeBSD 14.1 with a kernel lacking VIMAGE.
    pub fn freebsd_generic() -> Self {
        Self::new("FreeBSD", "14.1-RELEASE", Some(GENERIC_CONFTXT))
    }

    /// OpenBSD reporting `release`.
    pub fn openbsd(release: &str) -> Self {
        Self::new("OpenBSD", release, None)
    }

    /// Any other `uname -s` value.
    pub fn other(uname_s: &str) -> Self {
        Self::new(uname_s, "6.8.0", None)
    }

    /// Fail command lines starting with `prefix` with exit status `code`.
    pub fn fail(mut self, prefix: &str, code: i32) -> Self {
        self.failures.push((prefix.to_string(), code));
        self
    }

    /// Mark `path` as present before the run.
    pub fn with_existing(self, path: &str) -> Self {
        self.add_existing(Path::new(path));
        self
    }

    /// Mark `path` as present.
    pub fn add_existing(&self, path: &Path) {
        self.state
            .lock()
            .expect("host lock")
            .existing
            .insert(path.to_path_buf());
    }

    /// Every command line issued so far.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().expect("host lock").calls.clone()
    }

    /// Command lines other than read-only host queries.
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("uname") && !c.starts_with("sysctl"))
            .collect()
    }

    /// Whether the core is currently installed.
    pub fn core_installed(&self) -> bool {
        self.state.lock().expect("host lock").core_installed
    }

    /// Working directory each build command ran in.
    pub fn build_dirs(&self) -> Vec<PathBuf> {
        self.state.lock().expect("host lock").build_dirs.clone()
    }

    /// Current working directory.
    pub fn cwd(&self) -> PathBuf {
        self.state.lock().expect("host lock").cwd.clone()
    }

    fn answer(&self, line: &str) -> ExecResult {
        let ok = |stdout: &str| ExecResult {
            stdout: stdout.to_string(),
            stderr: String::new(),
            success: true,
            code: Some(0),
        };
        let failed = |code: i32, stderr: &str| ExecResult {
            stdout: String::new(),
            stderr: stderr.to_string(),
            success: false,
            code: Some(code),
        };

        if let Some((_, code)) = self.failures.iter().find(|(p, _)| line.starts_with(p)) {
            return failed(*code, "scripted failure");
        }

        match line {
            "uname -s" => return ok(&format!("{}\n", self.uname_s)),
            "uname -r" => return ok(&format!("{}\n", self.uname_r)),
            "sysctl -n kern.conftxt" => {
                return self.conftxt.as_deref().map_or_else(
                    || failed(1, "sysctl: unknown oid 'kern.conftxt'"),
                    ok,
                );
            }
            _ => {}
        }

        let mut state = self.state.lock().expect("host lock");
        let words: Vec<&str> = line.split_whitespace().collect();
        if line.ends_with("gmake install") {
            state.core_installed = true;
            let cwd = state.cwd.clone();
            state.build_dirs.push(cwd);
        } else if line.ends_with("gmake uninstall") {
            state.core_installed = false;
            let cwd = state.cwd.clone();
            state.build_dirs.push(cwd);
        } else if let Some(i) = words.iter().position(|w| *w == "sysrc") {
            if let Some(path) = words.get(i + 2) {
                state.existing.insert(PathBuf::from(path));
            }
        } else if let Some(i) = words.iter().position(|w| *w == "rm") {
            if let Some(path) = words.get(i + 2) {
                state.existing.remove(Path::new(path));
            }
        } else if words.first() == Some(&"git") && words.get(1) == Some(&"clone") {
            if let Some(dest) = words.get(3) {
                state.existing.insert(PathBuf::from(dest));
            }
        }
        ok("")
    }
}

impl Executor for FakeHost {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let result = self.run_unchecked(program, args)?;
        if result.success {
            Ok(result)
        } else {
            Err(CommandError {
                label: command_line(program, args),
                code: result.code.unwrap_or(-1),
                stderr: result.stderr,
            }
            .into())
        }
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let line = command_line(program, args);
        self.state
            .lock()
            .expect("host lock")
            .calls
            .push(line.clone());
        Ok(self.answer(&line))
    }

    fn which(&self, _program: &str) -> bool {
        true
    }
}

impl FileSystemOps for FakeHost {
    fn exists(&self, path: &Path) -> bool {
        self.state.lock().expect("host lock").existing.contains(path)
    }

    fn current_dir(&self) -> std::io::Result<PathBuf> {
        Ok(self.cwd())
    }

    fn set_current_dir(&self, path: &Path) -> std::io::Result<()> {
        self.state.lock().expect("host lock").cwd = path.to_path_buf();
        Ok(())
    }
}

/// A source tree in a temporary directory, run against a [`FakeHost`].
pub struct IntegrationTestContext {
    /// Temporary source root; any `util/install.toml` goes here.
    pub root: tempfile::TempDir,
    /// The scripted host.
    pub host: Arc<FakeHost>,
    /// Runtime handed to `dispatch`.
    pub runtime: Runtime,
}

impl IntegrationTestContext {
    /// Create a context with an empty source root.
    pub fn new(host: FakeHost) -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let host = Arc::new(host);
        let runtime = Runtime::new(
            Arc::clone(&host) as Arc<dyn Executor>,
            Arc::clone(&host) as Arc<dyn FileSystemOps>,
        );
        Self {
            root,
            host,
            runtime,
        }
    }

    /// Path to the source root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Write `content` as the source tree's `util/install.toml`.
    pub fn write_config(&self, content: &str) {
        let util = self.root.path().join("util");
        std::fs::create_dir_all(&util).expect("create util dir");
        std::fs::write(util.join("install.toml"), content).expect("write install.toml");
    }

    /// Run the installer with `args` followed by `--root <root>`.
    pub fn dispatch(&self, args: &[&str]) -> u8 {
        let root = self.root.path().to_str().expect("utf-8 temp path");
        let argv: Vec<&str> = args.iter().copied().chain(["--root", root]).collect();
        dispatch(argv, &self.runtime)
    }

    /// Controller checkout path for the default manifest.
    pub fn controller_checkout(&self) -> PathBuf {
        self.root
            .path()
            .parent()
            .expect("temp dir has a parent")
            .join("ryu")
    }
}
