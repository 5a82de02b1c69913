//! Console and log-file rendering of installer events.
//!
//! Events from [`Logger`](super::Logger) are routed by target: stage headers,
//! collaborator command lines, and plain messages. While a task runs, every
//! event is inside a `task` span whose name the file layer prefixes to each
//! line.
use std::borrow::Cow;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::field::{Field, Visit};
use tracing::span;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

pub(super) const STAGE_TARGET: &str = "mininet_install::stage";
pub(super) const COMMAND_TARGET: &str = "mininet_install::command";

/// Name of the span opened around each task.
const TASK_SPAN: &str = "task";

/// What kind of line an event renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Stage,
    Command { dry_run: bool },
    Message,
}

/// Fields the installer attaches to its events and spans.
#[derive(Debug, Default)]
struct Fields {
    message: String,
    dry_run: bool,
    task: Option<String>,
}

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "task" => self.task = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "dry_run" {
            self.dry_run = value;
        }
    }
}

impl Fields {
    fn of(event: &tracing::Event<'_>) -> (Self, Line) {
        let mut fields = Self::default();
        event.record(&mut fields);
        let line = match event.metadata().target() {
            STAGE_TARGET => Line::Stage,
            COMMAND_TARGET => Line::Command {
                dry_run: fields.dry_run,
            },
            _ => Line::Message,
        };
        (fields, line)
    }
}

/// Task name stored in the extensions of a `task` span.
#[derive(Debug, Clone)]
struct TaskName(String);

/// Remove terminal escape sequences (CSI sequences and two-byte escapes).
fn plain(text: &str) -> Cow<'_, str> {
    if !text.contains('\x1b') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        // A CSI sequence runs to its final byte; any other escape is two bytes.
        if chars.next() == Some('[') {
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
        }
    }
    Cow::Owned(out)
}

/// `$XDG_CACHE_HOME/mininet-install/<name>.log`, creating the directory.
pub(super) fn log_file_path(name: &str) -> Option<PathBuf> {
    let cache = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    let dir = cache.join("mininet-install");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{name}.log")))
}

/// Appends every event, debug included, to the run's log file.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Open the default log file for `name`.
    pub(super) fn new(name: &str) -> Option<Self> {
        Self::at(&log_file_path(name)?)
    }

    /// Start a fresh log at `path`.
    pub(super) fn at(path: &Path) -> Option<Self> {
        let started = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S");
        let header = format!(
            "# mininet-install {} started {started} UTC\n",
            crate::VERSION
        );
        fs::write(path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }

    fn render(level: tracing::Level, line: Line, task: Option<&str>, msg: &str) -> String {
        let time = chrono::Utc::now().format("%H:%M:%S");
        let scope = task.map_or_else(String::new, |t| format!(" [{t}]"));
        let body = match (line, level) {
            (Line::Stage, _) => format!("==> {msg}"),
            (Line::Command { dry_run: true }, _) => format!("(dry run) {msg}"),
            (Line::Command { dry_run: false }, _) => format!("$ {msg}"),
            (Line::Message, tracing::Level::ERROR) => format!("error: {msg}"),
            (Line::Message, tracing::Level::WARN) => format!("warning: {msg}"),
            (Line::Message, tracing::Level::DEBUG | tracing::Level::TRACE) => {
                format!("debug: {msg}")
            }
            (Line::Message, _) => msg.to_string(),
        };
        format!("{time}{scope} {body}")
    }
}

impl<S> tracing_subscriber::Layer<S> for FileLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        if attrs.metadata().name() != TASK_SPAN {
            return;
        }
        let mut fields = Fields::default();
        attrs.record(&mut fields);
        if let (Some(task), Some(span)) = (fields.task, ctx.span(id)) {
            span.extensions_mut().insert(TaskName(task));
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
        let (fields, line) = Fields::of(event);
        let task = ctx.event_scope(event).and_then(|scope| {
            scope.from_root().find_map(|span| {
                let extensions = span.extensions();
                extensions.get::<TaskName>().map(|t| t.0.clone())
            })
        });
        let rendered = Self::render(
            *event.metadata().level(),
            line,
            task.as_deref(),
            &plain(&fields.message),
        );
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{rendered}").ok();
        }
    }
}

/// Console rendering: colored, without timestamps or task prefixes.
struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let (fields, line) = Fields::of(event);
        let msg = &fields.message;
        match (line, *event.metadata().level()) {
            (Line::Stage, _) => writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            (Line::Command { dry_run: true }, _) => {
                writeln!(writer, "  \x1b[33m(dry run)\x1b[0m {msg}")
            }
            (Line::Command { dry_run: false }, _) => writeln!(writer, "  \x1b[36m$\x1b[0m {msg}"),
            (Line::Message, tracing::Level::ERROR) => writeln!(writer, "\x1b[31merror:\x1b[0m {msg}"),
            (Line::Message, tracing::Level::WARN) => {
                writeln!(writer, "\x1b[33mwarning:\x1b[0m {msg}")
            }
            (Line::Message, tracing::Level::INFO) => writeln!(writer, "  {msg}"),
            (Line::Message, _) => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Install the process-wide subscriber.
///
/// Warnings and errors go to stderr, everything else to stdout; debug lines
/// reach the console only when `verbose` is set. The log file under
/// `$XDG_CACHE_HOME/mininet-install/` receives every event. Calls after the
/// first are ignored.
pub fn init_subscriber(verbose: bool, name: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));
    let console = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(writer)
        .with_filter(console_level);
    let file = FileLayer::new(name).map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_leaves_clean_text_borrowed() {
        assert!(matches!(plain("sudo pkg install"), Cow::Borrowed(_)));
    }

    #[test]
    fn plain_strips_color_and_cursor_sequences() {
        assert_eq!(plain("\x1b[31merror:\x1b[0m gmake"), "error: gmake");
        assert_eq!(plain("\x1b[2Kfetching"), "fetching");
        assert_eq!(plain("\x1bMdone"), "done");
        assert_eq!(plain("tail\x1b["), "tail");
    }

    #[test]
    fn render_prefixes_task_and_kind() {
        let line = FileLayer::render(
            tracing::Level::INFO,
            Line::Command { dry_run: false },
            Some("vswitch"),
            "sudo service ovsdb-server onestart",
        );
        assert!(
            line.ends_with(" [vswitch] $ sudo service ovsdb-server onestart"),
            "{line}"
        );
        let line = FileLayer::render(tracing::Level::WARN, Line::Message, None, "careful");
        assert!(line.ends_with(" warning: careful"), "{line}");
    }
}
