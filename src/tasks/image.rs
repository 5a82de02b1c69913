//! Unattended build for VM images.
use super::{Action, Context, Task, TaskId};
use crate::backend::Backend;

/// Everything `dependencies` and `controller` install, run as the current
/// user without a capability check.
///
/// Image builds run as root inside the image, so no elevation tool is
/// involved and nothing may prompt.
#[derive(Debug)]
pub struct BuildImage;

impl Task for BuildImage {
    fn id(&self) -> TaskId {
        TaskId::ImageBuild
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn backend(&self, ctx: &Context) -> Backend {
        ctx.backend.unprivileged()
    }

    fn actions(&self, ctx: &Context) -> Vec<Action> {
        let config = &ctx.config;

        let mut packages = config.dependencies.clone();
        if let Some(controller) = &config.controller {
            for name in &controller.packages {
                if !packages.contains(name) {
                    packages.push(name.clone());
                }
            }
        }

        let mut actions = vec![Action::InstallPackages(packages)];
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
        if let Some(controller) = &config.controller {
            let dir = config.controller_dir(controller);
            actions.push(Action::FetchSource {
                url: controller.repository.clone(),
                dest: dir.clone(),
            });
            actions.push(Action::Build {
                dir,
                command: controller.build.clone(),
            });
        }
        actions
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::unreachable
)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;
    use crate::tasks::execute;
    use crate::tasks::test_helpers::{freebsd_context, fs_with, openbsd_context};
    use std::sync::Arc;

    #[test]
    fn freebsd_image_build_is_unprivileged() {
        let exec = Arc::new(MockExecutor::freebsd());
        let ctx = freebsd_context(Arc::clone(&exec), fs_with(&[]));
        execute(&BuildImage, &ctx).unwrap();
        let calls = exec.calls();
        assert!(calls.iter().all(|c| !c.starts_with("sudo")), "{calls:?}");
        assert!(
            calls[0].starts_with("pkg install -y python3")
                && calls[0].ends_with("gmake git py311-pip"),
            "{}",
            calls[0]
        );
        assert_eq!(
            calls[1..].to_vec(),
            vec![
                "gmake install",
                "git clone https://github.com/faucetsdn/ryu.git /src/ryu",
                "python3 -m pip install .",
            ]
        );
    }

    #[test]
    fn image_build_skips_capability_check() {
        let exec = Arc::new(MockExecutor::freebsd());
        let ctx = freebsd_context(Arc::clone(&exec), fs_with(&[]));
        execute(&BuildImage, &ctx).unwrap();
        assert!(!exec.calls().iter().any(|c| c.starts_with("sysctl")));
    }

    #[test]
    fn openbsd_image_build_has_no_controller() {
        let exec = Arc::new(MockExecutor::openbsd("7.4"));
        let ctx = openbsd_context(Arc::clone(&exec), fs_with(&[]));
        execute(&BuildImage, &ctx).unwrap();
        let calls = exec.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("pkg_add -I "));
        assert_eq!(calls[1], "gmake install");
    }

    #[test]
    fn shared_packages_are_installed_once() {
        let exec = Arc::new(MockExecutor::freebsd());
        let mut ctx = freebsd_context(exec, fs_with(&[]));
        let mut config = (*ctx.config).clone();
        config.dependencies.push("git".to_string());
        ctx.config = Arc::new(config);
        let Action::InstallPackages(packages) = &BuildImage.actions(&ctx)[0] else {
            unreachable!("first action installs packages");
        };
        assert_eq!(packages.iter().filter(|p| *p == "git").count(), 1);
    }
}
