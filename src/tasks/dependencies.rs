//! Core dependency installation and its inverse.
use super::{Action, Context, Task, TaskId};

/// Check the host, install native prerequisites, then build and install the
/// core from the source root.
#[derive(Debug)]
pub struct InstallDependencies;

impl Task for InstallDependencies {
    fn id(&self) -> TaskId {
        TaskId::Dependencies
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn actions(&self, ctx: &Context) -> Vec<Action> {
        let config = &ctx.config;
        let mut actions = vec![
            Action::CheckCapabilities,
            Action::InstallPackages(config.dependencies.clone()),
        ];
        actions.extend(
            config
                .package_files
                .iter()
                .cloned()
                .map(Action::AddPackageFile),
        );
        actions.push(Action::Build {
            dir: ctx.root.clone(),
            command: config.build_install.clone(),
        });
        if let Some(host) = &config.host_config {
            actions.push(Action::PlaceHostConfig {
                path: host.path.clone(),
                settings: host.settings.clone(),
            });
        }
        actions
    }
}

/// Uninstall the core and remove the host configuration file.
///
/// Native packages stay installed; other software may depend on them.
#[derive(Debug)]
pub struct UninstallDependencies;

impl Task for UninstallDependencies {
    fn id(&self) -> TaskId {
        TaskId::DependenciesUndo
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn actions(&self, ctx: &Context) -> Vec<Action> {
        let config = &ctx.config;
        let mut actions = vec![Action::Build {
            dir: ctx.root.clone(),
            command: config.build_uninstall.clone(),
        }];
        if let Some(host) = &config.host_config {
            actions.push(Action::RemoveHostConfig(host.path.clone()));
        }
        actions
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::defaults;
    use crate::exec::test_helpers::MockExecutor;
    use crate::platform::{OsFamily, Platform, Release};
    use crate::tasks::test_helpers::{
        ROOT, context_with_config, freebsd_context, fs_with, openbsd_context,
    };
    use crate::tasks::{TaskResult, execute};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    const LOADER_CONF: &str = "/boot/loader.conf.d/mininet.conf";

    #[test]
    fn freebsd_install_sequence() {
        let exec = Arc::new(MockExecutor::freebsd());
        let ctx = freebsd_context(Arc::clone(&exec), fs_with(&[]));
        assert_eq!(
            execute(&InstallDependencies, &ctx).unwrap(),
            TaskResult::Ok
        );
        insta::assert_debug_snapshot!(exec.calls(), @r#"
        [
            "sysctl -n kern.conftxt",
            "sudo pkg install -y python3 py311-setuptools py311-pexpect py311-pyflakes py311-pylint py311-pycodestyle help2man socat iperf gmake",
            "sudo gmake install",
            "sudo sysrc -f /boot/loader.conf.d/mininet.conf if_bridge_load=YES if_epair_load=YES",
        ]
        "#);
    }

    #[test]
    fn openbsd_install_has_no_host_config() {
        let exec = Arc::new(MockExecutor::openbsd("7.4"));
        let ctx = openbsd_context(Arc::clone(&exec), fs_with(&[]));
        execute(&InstallDependencies, &ctx).unwrap();
        let calls = exec.calls();
        assert!(calls[0].starts_with("doas pkg_add -I python%3"));
        assert_eq!(calls[1], "doas gmake install");
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn package_files_follow_bulk_install() {
        let platform = Platform::new(OsFamily::OpenBsd, Release::new(7, 4));
        let mut config = defaults::for_family(platform.family, Path::new(ROOT));
        config.package_files = vec![
            PathBuf::from("/src/mininet/a.tgz"),
            PathBuf::from("/src/mininet/b.tgz"),
        ];
        let exec = Arc::new(MockExecutor::new());
        let ctx = context_with_config(platform, config, Arc::clone(&exec), fs_with(&[]));
        execute(&InstallDependencies, &ctx).unwrap();
        let calls = exec.calls();
        assert_eq!(calls[1], "doas pkg_add -I -D unsigned /src/mininet/a.tgz");
        assert_eq!(calls[2], "doas pkg_add -I -D unsigned /src/mininet/b.tgz");
        assert_eq!(calls[3], "doas gmake install");
    }

    #[test]
    fn build_runs_in_source_root() {
        let exec = Arc::new(MockExecutor::freebsd());
        let ctx = freebsd_context(exec, fs_with(&[]));
        let actions = InstallDependencies.actions(&ctx);
        assert!(actions.contains(&Action::Build {
            dir: PathBuf::from(ROOT),
            command: vec!["gmake".into(), "install".into()],
        }));
        assert_eq!(actions[0], Action::CheckCapabilities);
    }

    #[test]
    fn undo_removes_installed_host_config() {
        let exec = Arc::new(MockExecutor::freebsd());
        let ctx = freebsd_context(Arc::clone(&exec), fs_with(&[LOADER_CONF]));
        execute(&UninstallDependencies, &ctx).unwrap();
        assert_eq!(
            exec.calls(),
            vec![
                "sudo gmake uninstall",
                "sudo rm -f /boot/loader.conf.d/mininet.conf"
            ]
        );
    }

    #[test]
    fn undo_skips_absent_host_config() {
        let exec = Arc::new(MockExecutor::freebsd());
        let ctx = freebsd_context(Arc::clone(&exec), fs_with(&[]));
        execute(&UninstallDependencies, &ctx).unwrap();
        assert_eq!(exec.calls(), vec!["sudo gmake uninstall"]);
    }

    #[test]
    fn undo_never_checks_capabilities() {
        let exec = Arc::new(MockExecutor::freebsd());
        let ctx = freebsd_context(exec, fs_with(&[]));
        assert!(
            !UninstallDependencies
                .actions(&ctx)
                .contains(&Action::CheckCapabilities)
        );
    }
}
