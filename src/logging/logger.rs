//! The run logger: emits events and keeps task outcomes for the summary.
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::subscriber::{COMMAND_TARGET, STAGE_TARGET, log_file_path};
use super::types::{Log, Tally, TaskEntry, TaskStatus};

/// Logger shared by every task of one run.
///
/// Messages become [`tracing`] events rendered by the subscriber from
/// [`init_subscriber`](super::init_subscriber); task outcomes are kept here
/// until [`Logger::print_summary`].
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<TaskEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Logger for a run whose log file is named after `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::with_log_file(log_file_path(name))
    }

    /// Logger that reports `log_file` in its summary, if any.
    #[must_use]
    pub const fn with_log_file(log_file: Option<PathBuf>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file,
        }
    }

    /// File this run logs to, if one could be opened.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Task outcomes recorded so far, in run order.
    #[must_use]
    pub fn task_entries(&self) -> Vec<TaskEntry> {
        self.entries.lock().map_or_else(|_| Vec::new(), |e| e.clone())
    }

    /// Number of failed tasks.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.tally().failed
    }

    /// Counts of recorded outcomes.
    #[must_use]
    pub fn tally(&self) -> Tally {
        self.entries
            .lock()
            .map_or_else(|_| Tally::default(), |e| Tally::of(&e))
    }

    /// One line per recorded task, then the tally and the log file.
    ///
    /// Prints nothing if no task was recorded.
    pub fn print_summary(&self) {
        let entries = self.task_entries();
        if entries.is_empty() {
            return;
        }

        self.stage("Summary");
        for entry in &entries {
            let detail = entry
                .detail
                .as_deref()
                .map_or_else(String::new, |d| format!(" ({d})"));
            self.info(&format!(
                "{}{} {}{detail}\x1b[0m",
                entry.status.color(),
                entry.status.symbol(),
                entry.name
            ));
        }
        self.info(&Tally::of(&entries).to_string());
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn command(&self, line: &str, dry_run: bool) {
        tracing::info!(target: COMMAND_TARGET, dry_run, "{line}");
    }

    fn record_task(&self, name: &str, status: TaskStatus, detail: Option<&str>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(TaskEntry {
                name: name.to_string(),
                status,
                detail: detail.map(str::to_string),
            });
        }
    }
}
