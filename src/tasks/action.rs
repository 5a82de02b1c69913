//! The primitive steps tasks are made of.
use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};

use super::context::Context;
use super::workdir::WorkdirGuard;
use crate::backend::Backend;
use crate::exec::command_line;
use crate::operations::FileSystemOps;

/// One step of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Verify host preconditions; never mutates.
    CheckCapabilities,
    /// Bulk install through the package manager.
    InstallPackages(Vec<String>),
    /// Bulk removal through the package manager.
    RemovePackages(Vec<String>),
    /// Install one local package file.
    AddPackageFile(PathBuf),
    /// Run an elevated build command inside `dir`.
    Build {
        /// Directory the command runs in.
        dir: PathBuf,
        /// Program and arguments, without elevation.
        command: Vec<String>,
    },
    /// Clone `url` into `dest` unless `dest` already exists.
    FetchSource {
        /// Repository to clone.
        url: String,
        /// Checkout directory.
        dest: PathBuf,
    },
    /// Start a daemon through the host service manager.
    StartService(String),
    /// Write `settings` into the `key=value` file at `path`.
    PlaceHostConfig {
        /// Destination file.
        path: PathBuf,
        /// Lines written, in order.
        settings: Vec<(String, String)>,
    },
    /// Delete the file at `path` if it exists.
    RemoveHostConfig(PathBuf),
}

fn borrowed(items: &[String]) -> Vec<&str> {
    items.iter().map(String::as_str).collect()
}

fn setting_args(settings: &[(String, String)]) -> Vec<String> {
    settings.iter().map(|(k, v)| format!("{k}={v}")).collect()
}

impl Action {
    /// Stage name reported when this action fails.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::CheckCapabilities => "capability check",
            Self::InstallPackages(_) => "package install",
            Self::RemovePackages(_) => "package removal",
            Self::AddPackageFile(_) => "package file install",
            Self::Build { .. } => "build",
            Self::FetchSource { .. } => "source fetch",
            Self::StartService(_) => "service start",
            Self::PlaceHostConfig { .. } => "host config install",
            Self::RemoveHostConfig(_) => "host config removal",
        }
    }

    /// Whether this action changes the host.
    #[must_use]
    pub const fn mutates(&self) -> bool {
        !matches!(self, Self::CheckCapabilities)
    }

    /// Why this action has nothing to do, if it hasn't.
    ///
    /// Evaluated before the action runs, in dry runs too.
    #[must_use]
    pub fn skip_reason(&self, fs: &dyn FileSystemOps) -> Option<String> {
        match self {
            Self::InstallPackages(names) | Self::RemovePackages(names) if names.is_empty() => {
                Some("no packages listed".to_string())
            }
            Self::FetchSource { dest, .. } if fs.exists(dest) => {
                Some(format!("{} already exists", dest.display()))
            }
            Self::RemoveHostConfig(path) if !fs.exists(path) => {
                Some(format!("{} is not installed", path.display()))
            }
            _ => None,
        }
    }

    /// The command line this action runs with `backend`.
    #[must_use]
    pub fn describe(&self, backend: &Backend) -> String {
        match self {
            Self::CheckCapabilities => "checking host capabilities".to_string(),
            Self::InstallPackages(names) => {
                let args = backend.install.with_operands(&borrowed(names));
                backend.describe(backend.install.program, &args)
            }
            Self::RemovePackages(names) => {
                let args = backend.remove.with_operands(&borrowed(names));
                backend.describe(backend.remove.program, &args)
            }
            Self::AddPackageFile(path) => {
                let path = path.to_string_lossy();
                let args = backend.add_single.with_operands(&[path.as_ref()]);
                backend.describe(backend.add_single.program, &args)
            }
            Self::Build { dir, command } => match command.split_first() {
                Some((program, args)) => format!(
                    "cd {} && {}",
                    dir.display(),
                    backend.describe(program, &borrowed(args))
                ),
                None => format!("cd {}", dir.display()),
            },
            Self::FetchSource { url, dest } => {
                let dest = dest.to_string_lossy();
                command_line("git", &["clone", url.as_str(), dest.as_ref()])
            }
            Self::StartService(name) => {
                let (program, args) = backend.services.start_command(name);
                backend.describe(program, &args)
            }
            Self::PlaceHostConfig { path, settings } => {
                let path = path.to_string_lossy();
                let settings = setting_args(settings);
                let mut args = vec!["-f", path.as_ref()];
                args.extend(settings.iter().map(String::as_str));
                backend.describe("sysrc", &args)
            }
            Self::RemoveHostConfig(path) => {
                let path = path.to_string_lossy();
                backend.describe("rm", &["-f", path.as_ref()])
            }
        }
    }

    /// Run this action against the host.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's failure, with context naming the action.
    /// An unmet host requirement is returned as a bare
    /// [`CapabilityError`](crate::error::CapabilityError).
    pub fn perform(&self, ctx: &Context, backend: &Backend) -> Result<()> {
        let exec = ctx.executor.as_ref();
        match self {
            Self::CheckCapabilities => {
                crate::capability::check(&ctx.platform, exec)?;
            }
            Self::InstallPackages(names) => {
                backend
                    .install_packages(exec, &borrowed(names))
                    .with_context(|| format!("installing {}", names.join(" ")))?;
            }
            Self::RemovePackages(names) => {
                backend
                    .remove_packages(exec, &borrowed(names))
                    .with_context(|| format!("removing {}", names.join(" ")))?;
            }
            Self::AddPackageFile(path) => {
                backend
                    .add_single_package(exec, path)
                    .with_context(|| format!("adding package file {}", path.display()))?;
            }
            Self::Build { dir, command } => {
                let Some((program, args)) = command.split_first() else {
                    bail!("empty build command for {}", dir.display());
                };
                let _guard = WorkdirGuard::enter(ctx.fs_ops.as_ref(), dir)?;
                backend
                    .privileged(exec, program, &borrowed(args))
                    .with_context(|| format!("building in {}", dir.display()))?;
            }
            Self::FetchSource { url, dest } => {
                let dest_str = dest.to_string_lossy();
                exec.run("git", &["clone", url.as_str(), dest_str.as_ref()])
                    .with_context(|| format!("fetching {url}"))?;
            }
            Self::StartService(name) => {
                backend
                    .start_service(exec, name)
                    .with_context(|| format!("starting {name}"))?;
            }
            Self::PlaceHostConfig { path, settings } => {
                let path_str = path.to_string_lossy();
                let settings = setting_args(settings);
                let mut args = vec!["-f", path_str.as_ref()];
                args.extend(settings.iter().map(String::as_str));
                backend
                    .privileged(exec, "sysrc", &args)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            Self::RemoveHostConfig(path) => {
                let path_str = path.to_string_lossy();
                backend
                    .privileged(exec, "rm", &["-f", path_str.as_ref()])
                    .with_context(|| format!("removing {}", path.display()))?;
            }
        }
        Ok(())
    }
}
