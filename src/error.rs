//! Domain-specific error types for the installer.
//!
//! Internal modules return typed errors (e.g., [`PlatformError`],
//! [`TaskError`]) which are aggregated by [`InstallerError`]. The command
//! layer maps each variant to a process exit code via
//! [`InstallerError::exit_code`].
//!
//! # Error hierarchy
//!
//! ```text
//! InstallerError
//! ├── Platform(PlatformError)     unsupported OS, detection failure
//! ├── Capability(CapabilityError) kernel feature or release floor unmet
//! ├── Config(ConfigError)         root resolution, TOML overrides
//! ├── Task(TaskError)             an action inside a task failed
//! └── Usage(String)               bad command line
//! ```

use thiserror::Error;

use crate::exec::CommandError;
use crate::platform::Release;

/// Exit code for a successful run.
pub const EXIT_OK: u8 = 0;
/// Exit code for failures that abort before any task runs.
pub const EXIT_FATAL: u8 = 1;
/// Exit code for command-line usage errors.
pub const EXIT_USAGE: u8 = 2;
/// Exit code for a task failure whose collaborator status is unknown or
/// collides with the codes above.
pub const EXIT_TASK: u8 = 3;

/// Top-level error type for an installer run.
#[derive(Error, Debug)]
pub enum InstallerError {
    /// Platform detection or backend selection failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// A host precondition is not met.
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// Configuration could not be resolved or loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A task action failed.
    #[error(transparent)]
    Task(#[from] TaskError),

    /// The command line could not be parsed.
    #[error("usage error: {0}")]
    Usage(String),
}

impl InstallerError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Platform(_) | Self::Capability(_) | Self::Config(_) => EXIT_FATAL,
            Self::Usage(_) => EXIT_USAGE,
            Self::Task(e) => e.exit_code(),
        }
    }
}

/// Errors that arise while identifying the host platform.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The host OS family is not one this installer supports.
    #[error("unsupported platform '{family}': expected FreeBSD or OpenBSD; {hint}")]
    Unsupported {
        /// Family reported by the host (e.g., `"Linux"`).
        family: String,
        /// Where the user should go instead.
        hint: String,
    },

    /// The host could not be queried or reported something unparseable.
    #[error("platform detection failed: {0}")]
    DetectionFailed(String),
}

impl PlatformError {
    /// Build an [`Unsupported`](Self::Unsupported) error with the entry
    /// point appropriate for `family`.
    #[must_use]
    pub fn unsupported(family: &str) -> Self {
        let hint = if family.eq_ignore_ascii_case("linux") {
            "on Linux run util/install.sh instead".to_string()
        } else {
            "no installer is available for this platform".to_string()
        };
        Self::Unsupported {
            family: family.to_string(),
            hint,
        }
    }
}

/// Errors raised by host capability checks.
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// The running kernel lacks a required configuration option.
    #[error(
        "kernel is missing 'options {feature}'; rebuild the kernel using the sample configuration in {sample}"
    )]
    MissingKernelFeature {
        /// Kernel option name (e.g., `VIMAGE`).
        feature: String,
        /// Sample kernel configuration shipped with the source tree.
        sample: String,
    },

    /// The host release is older than the supported floor.
    #[error("release {detected} is not supported; {floor} or newer is required")]
    ReleaseTooOld {
        /// Release reported by the host.
        detected: Release,
        /// Minimum supported release.
        floor: Release,
    },

    /// The kernel configuration could not be queried.
    #[error("could not query {attribute}: {reason}")]
    QueryFailed {
        /// Kernel attribute that was queried.
        attribute: String,
        /// Why the query failed.
        reason: String,
    },
}

/// Errors that arise while resolving or loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The source tree root could not be located.
    #[error("cannot determine the mininet source root: {0}")]
    RootNotFound(String),

    /// A config file could not be read.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A config file is not valid TOML or has unexpected keys.
    #[error("invalid config file {path}: {message}")]
    Parse {
        /// Path to the offending file.
        path: String,
        /// Parser diagnostic.
        message: String,
    },
}

/// An action inside a task failed; earlier actions stay applied.
#[derive(Error, Debug)]
#[error("task '{task}' failed during {stage}: {source:#}")]
pub struct TaskError {
    /// Name of the task that failed.
    pub task: String,
    /// Stage (action kind) that failed.
    pub stage: String,
    /// Underlying failure.
    #[source]
    pub source: anyhow::Error,
}

impl TaskError {
    /// Exit code propagated from the failing collaborator.
    ///
    /// Uses the collaborator's exit status when it is recoverable from the
    /// error chain, fits in a `u8`, and does not collide with the fatal or
    /// usage codes; otherwise [`EXIT_TASK`].
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.source
            .chain()
            .find_map(|e| e.downcast_ref::<CommandError>())
            .and_then(|e| u8::try_from(e.code).ok())
            .filter(|code| *code > EXIT_USAGE)
            .unwrap_or(EXIT_TASK)
    }
}
