//! Command-line flags and their resolution into a task list.
use clap::{Args, Parser};

use crate::tasks::TaskId;

/// Command-line entry point for the BSD dependency installer.
#[derive(Parser, Debug)]
#[command(
    name = "mininet-install",
    about = "Install Mininet and its dependencies on FreeBSD and OpenBSD",
    long_about = "Install Mininet and its dependencies on FreeBSD and OpenBSD.\n\n\
                  With no task flag, installs the dependencies, the virtual switch \
                  and the controller where the platform supports them.",
    version = crate::VERSION
)]
pub struct Cli {
    /// Task selection.
    #[command(flatten)]
    pub tasks: TaskFlags,

    /// Options that apply to every task.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Flags selecting what to install or remove.
#[derive(Args, Debug, Clone, Default)]
pub struct TaskFlags {
    /// Install everything that applies to this platform (default)
    #[arg(short, long)]
    pub all: bool,

    /// Install core dependencies and build Mininet
    #[arg(short = 'n', long)]
    pub dependencies: bool,

    /// Uninstall Mininet (ignores every other task flag)
    #[arg(short, long)]
    pub uninstall: bool,

    /// Install the virtual switch
    #[arg(short, long)]
    pub vswitch: bool,

    /// Remove the virtual switch
    #[arg(short, long)]
    pub remove_vswitch: bool,

    /// Install the SDN controller
    #[arg(short = 'y', long)]
    pub controller: bool,

    /// Unattended install for VM images (no elevation, no capability check)
    #[arg(short, long)]
    pub image: bool,
}

/// Options that do not select tasks.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Show debug output on the console
    #[arg(long)]
    pub verbose: bool,

    /// Print what would be done without changing the system
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Mininet source tree (default: $MININET_ROOT, then the binary's or current directory)
    #[arg(long, value_name = "PATH")]
    pub root: Option<std::path::PathBuf>,

    /// TOML file overriding the built-in package lists (default: <root>/util/install.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<std::path::PathBuf>,
}

/// Whether a run adds or removes software.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Add software to the host.
    Install,
    /// Remove software from the host.
    Uninstall,
}

/// The tasks one invocation runs, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleRequest {
    /// Tasks to run, sorted and deduplicated.
    pub tasks: Vec<TaskId>,
    /// Direction of the run.
    pub mode: Mode,
}

impl TaskFlags {
    fn selected(&self) -> Vec<TaskId> {
        [
            (self.dependencies, TaskId::Dependencies),
            (self.vswitch, TaskId::VSwitch),
            (self.remove_vswitch, TaskId::VSwitchRemove),
            (self.controller, TaskId::Controller),
            (self.image, TaskId::ImageBuild),
        ]
        .into_iter()
        .filter_map(|(set, id)| set.then_some(id))
        .collect()
    }

    /// Resolve the flags into the ordered task list.
    ///
    /// `-u` wins over everything else. Otherwise `-a`, or no task flag at
    /// all, selects the default set, and the union is sorted into the fixed
    /// execution order so flag order never matters.
    #[must_use]
    pub fn request(&self) -> LifecycleRequest {
        if self.uninstall {
            return LifecycleRequest {
                tasks: vec![TaskId::DependenciesUndo],
                mode: Mode::Uninstall,
            };
        }

        let mut tasks = self.selected();
        if self.all || tasks.is_empty() {
            tasks.extend(TaskId::DEFAULT);
        }
        tasks.sort_unstable();
        tasks.dedup();

        LifecycleRequest {
            tasks,
            mode: Mode::Install,
        }
    }
}
