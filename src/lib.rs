//! Dependency installer for Mininet on BSD hosts.
//!
//! Detects the host platform, binds a package-management backend to it, and
//! runs an ordered list of install or uninstall tasks selected on the command
//! line. Every external program is reached through the [`exec::Executor`]
//! seam.
//!
//! The public API is organised into four layers:
//!
//! - **[`platform`]**, **[`capability`]**, **[`backend`]**: what the host is,
//!   whether it can run the emulator, and how to install software on it
//! - **[`config`]**: per-family package manifests with TOML overrides
//! - **[`tasks`]**: named action lists and the runner that executes them
//! - **[`commands`]**: flag parsing, orchestration, and exit codes
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod backend;
pub mod capability;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod operations;
pub mod platform;
pub mod tasks;

/// Version reported by `--version` and written to the log header.
pub const VERSION: &str = match option_env!("MININET_INSTALL_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
