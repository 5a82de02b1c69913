//! Package-management backends bound to a detected platform.
use std::path::Path;

use anyhow::Result;

use crate::error::PlatformError;
use crate::exec::{ExecResult, Executor};
use crate::platform::{OsFamily, Platform};

/// Native package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// FreeBSD `pkg(8)`.
    Pkg,
    /// OpenBSD `pkg_add(1)` / `pkg_delete(1)`.
    PkgTools,
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pkg => write!(f, "pkg"),
            Self::PkgTools => write!(f, "pkg_add"),
        }
    }
}

/// Tool used to run privileged commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// `sudo(8)`, the FreeBSD default.
    Sudo,
    /// `doas(1)`, the OpenBSD default.
    Doas,
    /// Run commands as the current user (image builds).
    None,
}

impl Elevation {
    /// The wrapper program, if any.
    #[must_use]
    pub const fn program(self) -> Option<&'static str> {
        match self {
            Self::Sudo => Some("sudo"),
            Self::Doas => Some("doas"),
            Self::None => None,
        }
    }
}

/// Host service manager used to start daemons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceManager {
    /// FreeBSD `service(8)`; `onestart` ignores the `rc.conf` enable knob.
    Service,
    /// OpenBSD `rcctl(8)`; `-f` ignores the `rc.conf.local` flags.
    Rcctl,
}

impl ServiceManager {
    /// Program and arguments that start `name`.
    #[must_use]
    pub fn start_command(self, name: &str) -> (&'static str, Vec<&str>) {
        match self {
            Self::Service => ("service", vec![name, "onestart"]),
            Self::Rcctl => ("rcctl", vec!["-f", "start", name]),
        }
    }
}

/// A command prefix to which operands are appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTemplate {
    /// Program to run.
    pub program: &'static str,
    /// Fixed leading arguments.
    pub args: &'static [&'static str],
}

impl CommandTemplate {
    const fn new(program: &'static str, args: &'static [&'static str]) -> Self {
        Self { program, args }
    }

    /// Full argument vector with `operands` appended.
    pub fn with_operands<'a>(&self, operands: &[&'a str]) -> Vec<&'a str> {
        let mut args: Vec<&str> = self.args.to_vec();
        args.extend_from_slice(operands);
        args
    }
}

/// Package operations bound to one platform.
///
/// Every field is resolved at construction; there is no partially bound
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backend {
    /// Package manager the templates belong to.
    pub manager: PackageManager,
    /// Wrapper prepended to privileged commands.
    pub elevation: Elevation,
    /// Bulk install of named packages.
    pub install: CommandTemplate,
    /// Bulk removal of named packages.
    pub remove: CommandTemplate,
    /// Install of a single package file.
    pub add_single: CommandTemplate,
    /// Starts daemons.
    pub services: ServiceManager,
}

/// Supported families and their backends. Package operations are always
/// non-interactive since collaborator output is captured.
const BACKENDS: &[(OsFamily, Backend)] = &[
    (
        OsFamily::FreeBsd,
        Backend {
            manager: PackageManager::Pkg,
            elevation: Elevation::Sudo,
            install: CommandTemplate::new("pkg", &["install", "-y"]),
            remove: CommandTemplate::new("pkg", &["remove", "-y"]),
            add_single: CommandTemplate::new("pkg", &["add"]),
            services: ServiceManager::Service,
        },
    ),
    (
        OsFamily::OpenBsd,
        Backend {
            manager: PackageManager::PkgTools,
            elevation: Elevation::Doas,
            install: CommandTemplate::new("pkg_add", &["-I"]),
            remove: CommandTemplate::new("pkg_delete", &["-I"]),
            add_single: CommandTemplate::new("pkg_add", &["-I", "-D", "unsigned"]),
            services: ServiceManager::Rcctl,
        },
    ),
];

impl Backend {
    /// Look up the backend for `platform`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Unsupported`] if no backend is registered for
    /// the platform's family.
    pub fn select(platform: &Platform) -> Result<Self, PlatformError> {
        BACKENDS
            .iter()
            .find(|(family, _)| *family == platform.family)
            .map(|(_, backend)| *backend)
            .ok_or_else(|| PlatformError::unsupported(platform.family.uname()))
    }

    /// The same backend without privilege elevation.
    #[must_use]
    pub const fn unprivileged(self) -> Self {
        Self {
            elevation: Elevation::None,
            ..self
        }
    }

    /// Install `names` in one package-manager invocation.
    ///
    /// An empty list issues no command.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager fails.
    pub fn install_packages(&self, executor: &dyn Executor, names: &[&str]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        self.privileged(executor, self.install.program, &self.install.with_operands(names))?;
        Ok(())
    }

    /// Remove `names` in one package-manager invocation.
    ///
    /// An empty list issues no command.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager fails.
    pub fn remove_packages(&self, executor: &dyn Executor, names: &[&str]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        self.privileged(executor, self.remove.program, &self.remove.with_operands(names))?;
        Ok(())
    }

    /// Install a single package file.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager fails.
    pub fn add_single_package(&self, executor: &dyn Executor, path: &Path) -> Result<()> {
        let path = path.to_string_lossy();
        let args = self.add_single.with_operands(&[path.as_ref()]);
        self.privileged(executor, self.add_single.program, &args)?;
        Ok(())
    }

    /// Start the daemon `name` through the host service manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the service manager fails.
    pub fn start_service(&self, executor: &dyn Executor, name: &str) -> Result<()> {
        let (program, args) = self.services.start_command(name);
        self.privileged(executor, program, &args)?;
        Ok(())
    }

    /// Run `program` through this backend's elevation tool.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub fn privileged(
        &self,
        executor: &dyn Executor,
        program: &str,
        args: &[&str],
    ) -> Result<ExecResult> {
        match self.elevation.program() {
            Some(wrapper) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(program);
                full.extend_from_slice(args);
                executor.run(wrapper, &full)
            }
            None => executor.run(program, args),
        }
    }

    /// Human-readable rendering of a privileged command, for dry runs.
    #[must_use]
    pub fn describe(&self, program: &str, args: &[&str]) -> String {
        let line = crate::exec::command_line(program, args);
        match self.elevation.program() {
            Some(wrapper) => format!("{wrapper} {line}"),
            None => line,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;
    use crate::platform::Release;

    fn freebsd() -> Platform {
        Platform::new(OsFamily::FreeBsd, Release::new(14, 1))
    }

    fn openbsd() -> Platform {
        Platform::new(OsFamily::OpenBsd, Release::new(7, 4))
    }

    #[test]
    fn every_family_has_a_backend() {
        for family in OsFamily::ALL {
            let p = Platform::new(family, Release::new(7, 0));
            assert!(Backend::select(&p).is_ok(), "no backend for {family}");
        }
    }

    #[test]
    fn select_is_pure() {
        for p in [freebsd(), openbsd()] {
            assert_eq!(Backend::select(&p).unwrap(), Backend::select(&p).unwrap());
        }
    }

    #[test]
    fn freebsd_uses_pkg_with_sudo() {
        let b = Backend::select(&freebsd()).unwrap();
        assert_eq!(b.manager, PackageManager::Pkg);
        assert_eq!(b.elevation, Elevation::Sudo);
        let exec = MockExecutor::new();
        b.install_packages(&exec, &["socat", "iperf"]).unwrap();
        b.remove_packages(&exec, &["openvswitch"]).unwrap();
        b.add_single_package(&exec, Path::new("/tmp/mininet.pkg"))
            .unwrap();
        b.start_service(&exec, "ovsdb-server").unwrap();
        assert_eq!(
            exec.calls(),
            vec![
                "sudo pkg install -y socat iperf",
                "sudo pkg remove -y openvswitch",
                "sudo pkg add /tmp/mininet.pkg",
                "sudo service ovsdb-server onestart",
            ]
        );
    }

    #[test]
    fn openbsd_uses_pkg_tools_with_doas() {
        let b = Backend::select(&openbsd()).unwrap();
        assert_eq!(b.manager, PackageManager::PkgTools);
        let exec = MockExecutor::new();
        b.install_packages(&exec, &["socat"]).unwrap();
        b.remove_packages(&exec, &["socat"]).unwrap();
        b.add_single_package(&exec, Path::new("/tmp/x.tgz")).unwrap();
        b.start_service(&exec, "switchd").unwrap();
        assert_eq!(
            exec.calls(),
            vec![
                "doas pkg_add -I socat",
                "doas pkg_delete -I socat",
                "doas pkg_add -I -D unsigned /tmp/x.tgz",
                "doas rcctl -f start switchd",
            ]
        );
    }

    #[test]
    fn unprivileged_drops_elevation() {
        let b = Backend::select(&freebsd()).unwrap().unprivileged();
        let exec = MockExecutor::new();
        b.install_packages(&exec, &["socat"]).unwrap();
        assert_eq!(exec.calls(), vec!["pkg install -y socat"]);
    }

    #[test]
    fn empty_package_lists_issue_no_command() {
        let b = Backend::select(&openbsd()).unwrap();
        let exec = MockExecutor::new();
        b.install_packages(&exec, &[]).unwrap();
        b.remove_packages(&exec, &[]).unwrap();
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn install_failure_propagates() {
        let b = Backend::select(&freebsd()).unwrap();
        let exec = MockExecutor::new().fail("sudo pkg install", 70);
        assert!(b.install_packages(&exec, &["socat"]).is_err());
    }

    #[test]
    fn describe_includes_wrapper() {
        let b = Backend::select(&openbsd()).unwrap();
        assert_eq!(b.describe("gmake", &["install"]), "doas gmake install");
        assert_eq!(
            b.unprivileged().describe("gmake", &["install"]),
            "gmake install"
        );
    }

    #[test]
    fn package_manager_display() {
        assert_eq!(PackageManager::Pkg.to_string(), "pkg");
        assert_eq!(PackageManager::PkgTools.to_string(), "pkg_add");
    }
}
