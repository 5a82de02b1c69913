//! Command-line entry point for the Mininet dependency installer.

use std::process::ExitCode;

use mininet_install::commands::{Runtime, dispatch};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    ExitCode::from(dispatch(std::env::args_os().skip(1), &Runtime::system()))
}
