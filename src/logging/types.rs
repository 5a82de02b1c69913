//! Task outcomes, the run tally, and the [`Log`] trait tasks write through.
use std::fmt;

/// Outcome of one task, as shown in the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    /// Task name as printed.
    pub name: String,
    /// How the task ended.
    pub status: TaskStatus,
    /// Why the task was skipped or how it failed.
    pub detail: Option<String>,
}

/// Final state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Every action ran.
    Ok,
    /// The task has nothing to do on this platform.
    NotApplicable,
    /// Commands were printed instead of run.
    DryRun,
    /// An action failed; later tasks did not run.
    Failed,
}

impl TaskStatus {
    /// One-character marker for summary lines.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::NotApplicable => "·",
            Self::DryRun => "~",
            Self::Failed => "✗",
        }
    }

    /// SGR color code for the summary line.
    #[must_use]
    pub(super) const fn color(self) -> &'static str {
        match self {
            Self::Ok => "\x1b[32m",
            Self::NotApplicable => "\x1b[2m",
            Self::DryRun => "\x1b[37m",
            Self::Failed => "\x1b[31m",
        }
    }
}

/// Per-status counts over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Tasks that completed.
    pub ok: usize,
    /// Tasks with nothing to do.
    pub not_applicable: usize,
    /// Tasks whose commands were only printed.
    pub dry_run: usize,
    /// Tasks that failed.
    pub failed: usize,
}

impl Tally {
    /// Count `entries` by status.
    #[must_use]
    pub fn of(entries: &[TaskEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut tally, entry| {
            match entry.status {
                TaskStatus::Ok => tally.ok += 1,
                TaskStatus::NotApplicable => tally.not_applicable += 1,
                TaskStatus::DryRun => tally.dry_run += 1,
                TaskStatus::Failed => tally.failed += 1,
            }
            tally
        })
    }

    /// Number of tasks counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.ok + self.not_applicable + self.dry_run + self.failed
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tasks: {} ok, {} n/a, {} dry-run, {} failed",
            self.total(),
            self.ok,
            self.not_applicable,
            self.dry_run,
            self.failed
        )
    }
}

/// Sink for everything a run reports.
///
/// Tasks only see this trait, so a test can hand them a logger that writes
/// to a temporary file.
pub trait Log: Send + Sync {
    /// Start of a task or a phase of the run.
    fn stage(&self, msg: &str);
    /// Progress shown on the console.
    fn info(&self, msg: &str);
    /// Shown on the console with `--verbose`; always written to the log file.
    fn debug(&self, msg: &str);
    /// Something the user should look at; the run continues.
    fn warn(&self, msg: &str);
    /// A failure, reported before the run stops.
    fn error(&self, msg: &str);
    /// A collaborator command line, either about to run or, in a dry run,
    /// only printed.
    fn command(&self, line: &str, dry_run: bool);
    /// Remember a task outcome for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, detail: Option<&str>);
}
