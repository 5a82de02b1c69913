//! Virtual switch install and removal.
use super::{Action, Context, Task, TaskId};

/// Install the virtual switch packages and start its daemons.
#[derive(Debug)]
pub struct InstallVSwitch;

impl Task for InstallVSwitch {
    fn id(&self) -> TaskId {
        TaskId::VSwitch
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.config.vswitch.is_some()
    }

    fn actions(&self, ctx: &Context) -> Vec<Action> {
        let Some(vswitch) = &ctx.config.vswitch else {
            return Vec::new();
        };
        std::iter::once(Action::InstallPackages(vswitch.packages.clone()))
            .chain(vswitch.daemons.iter().cloned().map(Action::StartService))
            .collect()
    }
}

/// Remove the virtual switch packages.
///
/// Daemons are not stopped first; package removal takes care of that.
#[derive(Debug)]
pub struct RemoveVSwitch;

impl Task for RemoveVSwitch {
    fn id(&self) -> TaskId {
        TaskId::VSwitchRemove
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.config.vswitch.is_some()
    }

    fn actions(&self, ctx: &Context) -> Vec<Action> {
        ctx.config
            .vswitch
            .as_ref()
            .map(|v| vec![Action::RemovePackages(v.packages.clone())])
            .unwrap_or_default()
    }
}
