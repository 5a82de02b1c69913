//! SDN controller installation.
use super::{Action, Context, Task, TaskId};

/// Fetch the controller source next to the source tree and install it.
///
/// There is no inverse task; the checkout and the installed controller are
/// left for the user to remove.
#[derive(Debug)]
pub struct InstallController;

impl Task for InstallController {
    fn id(&self) -> TaskId {
        TaskId::Controller
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.config.controller.is_some()
    }

    fn actions(&self, ctx: &Context) -> Vec<Action> {
        let Some(controller) = &ctx.config.controller else {
            return Vec::new();
        };
        let dir = ctx.config.controller_dir(controller);
        vec![
            Action::InstallPackages(controller.packages.clone()),
            Action::FetchSource {
                url: controller.repository.clone(),
                dest: dir.clone(),
            },
            Action::Build {
                dir,
                command: controller.build.clone(),
            },
        ]
    }
}
