//! Named tasks that provision the emulator stack as ordered action lists.
pub mod action;
pub mod context;
pub mod controller;
pub mod dependencies;
pub mod image;
pub mod vswitch;
pub mod workdir;

pub use action::Action;
pub use context::Context;

use crate::backend::Backend;
use crate::error::{CapabilityError, InstallerError, TaskError};
use crate::logging::TaskStatus;

/// Identifies a task; declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskId {
    /// Core packages, the optional package files and the emulator build.
    Dependencies,
    /// Removal of the core packages and the installed emulator.
    DependenciesUndo,
    /// Virtual switch packages and daemons.
    VSwitch,
    /// Removal of the virtual switch packages.
    VSwitchRemove,
    /// SDN controller checkout and install.
    Controller,
    /// Packages needed to build VM images, installed unprivileged.
    ImageBuild,
}

impl TaskId {
    /// Every task, in execution order.
    pub const ORDER: [Self; 6] = [
        Self::Dependencies,
        Self::DependenciesUndo,
        Self::VSwitch,
        Self::VSwitchRemove,
        Self::Controller,
        Self::ImageBuild,
    ];

    /// Tasks run when no task flag is given.
    pub const DEFAULT: [Self; 3] = [Self::Dependencies, Self::VSwitch, Self::Controller];

    /// Name used in logs and the run summary.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DependenciesUndo => "dependencies-undo",
            Self::VSwitch => "vswitch",
            Self::VSwitchRemove => "vswitch-remove",
            Self::Controller => "controller",
            Self::ImageBuild => "image-build",
        }
    }

    /// The task implementation for this id.
    #[must_use]
    pub fn task(self) -> &'static dyn Task {
        match self {
            Self::Dependencies => &dependencies::InstallDependencies,
            Self::DependenciesUndo => &dependencies::UninstallDependencies,
            Self::VSwitch => &vswitch::InstallVSwitch,
            Self::VSwitchRemove => &vswitch::RemoveVSwitch,
            Self::Controller => &controller::InstallController,
            Self::ImageBuild => &image::BuildImage,
        }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A named, executable task.
///
/// A task is a stateless description: [`Task::actions`] is computed from the
/// context each time and [`execute`] runs the result.
pub trait Task: Send + Sync {
    /// Identifier of this task.
    fn id(&self) -> TaskId;

    /// Human-readable task name.
    fn name(&self) -> &'static str {
        self.id().name()
    }

    /// Whether this task applies to the current platform and manifest.
    fn should_run(&self, ctx: &Context) -> bool;

    /// The steps of this task, in order.
    fn actions(&self, ctx: &Context) -> Vec<Action>;

    /// Backend used to run the actions.
    fn backend(&self, ctx: &Context) -> Backend {
        ctx.backend
    }
}

/// Outcome of a task that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskResult {
    /// Every action ran.
    Ok,
    /// The task does not apply here.
    NotApplicable,
    /// Mutating actions were only logged.
    DryRun,
}

/// Execute a task, recording the result in the logger.
///
/// Actions run strictly in order and the first failure stops the task.
/// Actions that already ran stay applied.
///
/// # Errors
///
/// Returns [`InstallerError::Capability`] if the capability check fails and
/// [`InstallerError::Task`] naming the failing stage for any other action.
pub fn execute(task: &dyn Task, ctx: &Context) -> Result<TaskResult, InstallerError> {
    if !task.should_run(ctx) {
        let reason = format!("not configured for {}", ctx.platform.family);
        ctx.log
            .debug(&format!("skipping task: {} ({reason})", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, Some(&reason));
        return Ok(TaskResult::NotApplicable);
    }

    let _span = tracing::info_span!("task", task = task.name()).entered();
    ctx.log.stage(task.name());
    let backend = task.backend(ctx);

    for action in task.actions(ctx) {
        if let Err(e) = run_action(task, &action, &backend, ctx) {
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&e.to_string()));
            return Err(e);
        }
    }

    if ctx.dry_run {
        ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
        Ok(TaskResult::DryRun)
    } else {
        ctx.log.record_task(task.name(), TaskStatus::Ok, None);
        Ok(TaskResult::Ok)
    }
}

fn run_action(
    task: &dyn Task,
    action: &Action,
    backend: &Backend,
    ctx: &Context,
) -> Result<(), InstallerError> {
    if let Some(reason) = action.skip_reason(ctx.fs_ops.as_ref()) {
        ctx.log.info(&format!("{}: skipped, {reason}", action.stage()));
        return Ok(());
    }

    // Read-only actions run in dry runs as well.
    if action.mutates() {
        ctx.log.command(&action.describe(backend), ctx.dry_run);
        if ctx.dry_run {
            return Ok(());
        }
    } else {
        ctx.log
            .info(&format!("{} on {}", action.describe(backend), ctx.platform));
    }

    action
        .perform(ctx, backend)
        .map_err(|source| match source.downcast::<CapabilityError>() {
            Ok(unmet) => InstallerError::Capability(unmet),
            Err(source) => TaskError {
                task: task.name().to_string(),
                stage: action.stage().to_string(),
                source,
            }
            .into(),
        })
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::test_helpers::{context, freebsd_context, fs_with, openbsd_context};
    use super::*;
    use crate::exec::test_helpers::MockExecutor;
    use crate::platform::{OsFamily, Platform, Release};
    use std::sync::Arc;

    #[test]
    fn order_matches_declaration_order() {
        let mut sorted = TaskId::ORDER;
        sorted.sort();
        assert_eq!(sorted, TaskId::ORDER);
    }

    #[test]
    fn every_id_maps_to_its_task() {
        for id in TaskId::ORDER {
            assert_eq!(id.task().id(), id);
            assert_eq!(id.task().name(), id.name());
        }
    }

    #[test]
    fn names_are_kebab_case() {
        let names: Vec<String> = TaskId::ORDER.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "dependencies",
                "dependencies-undo",
                "vswitch",
                "vswitch-remove",
                "controller",
                "image-build"
            ]
        );
    }

    #[test]
    fn not_applicable_task_issues_nothing() {
        let exec = Arc::new(MockExecutor::openbsd("7.4"));
        let ctx = openbsd_context(Arc::clone(&exec), fs_with(&[]));
        let result = execute(TaskId::VSwitch.task(), &ctx).unwrap();
        assert_eq!(result, TaskResult::NotApplicable);
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn capability_failure_is_not_a_task_error() {
        let exec = Arc::new(MockExecutor::openbsd("6.0"));
        let ctx = context(
            Platform::new(OsFamily::OpenBsd, Release::new(6, 0)),
            Arc::clone(&exec),
            fs_with(&[]),
        );
        let err = execute(TaskId::Dependencies.task(), &ctx).unwrap_err();
        assert!(matches!(err, InstallerError::Capability(_)), "{err}");
        assert!(exec.calls().is_empty(), "no package commands issued");
    }

    #[test]
    fn first_failing_action_stops_the_task() {
        let exec = Arc::new(MockExecutor::freebsd().fail("sudo gmake install", 2));
        let ctx = freebsd_context(Arc::clone(&exec), fs_with(&[]));
        let err = execute(TaskId::Dependencies.task(), &ctx).unwrap_err();
        let InstallerError::Task(task_err) = err else {
            panic!("expected a task error");
        };
        assert_eq!(task_err.task, "dependencies");
        assert_eq!(task_err.stage, "build");
        assert!(!exec.calls().iter().any(|c| c.starts_with("sudo sysrc")));
    }

    #[test]
    fn dry_run_only_reads_host_state() {
        let exec = Arc::new(MockExecutor::freebsd());
        let ctx = freebsd_context(Arc::clone(&exec), fs_with(&[])).with_dry_run(true);
        let result = execute(TaskId::Dependencies.task(), &ctx).unwrap();
        assert_eq!(result, TaskResult::DryRun);
        assert_eq!(exec.calls(), vec!["sysctl -n kern.conftxt"]);
    }

    #[test]
    fn dry_run_still_enforces_capabilities() {
        let exec = Arc::new(MockExecutor::new().respond("sysctl", "options\tINET\n"));
        let ctx = freebsd_context(Arc::clone(&exec), fs_with(&[])).with_dry_run(true);
        let err = execute(TaskId::Dependencies.task(), &ctx).unwrap_err();
        assert!(matches!(err, InstallerError::Capability(_)), "{err}");
        assert_eq!(err.exit_code(), 1);
    }
}
