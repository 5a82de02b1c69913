//! Build script: embeds the version string reported by the binary.

use std::process::Command;

const VERSION_VAR: &str = "MININET_INSTALL_VERSION";

/// `git describe` of the checkout being built, if it is a git checkout.
fn describe_checkout() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!version.is_empty()).then_some(version)
}

fn main() {
    // A release build pins the version; local builds describe the checkout.
    // Without either, the binary reports its Cargo package version.
    let version = std::env::var(VERSION_VAR).ok().or_else(describe_checkout);
    if let Some(version) = version {
        println!("cargo:rustc-env={VERSION_VAR}={version}");
    }

    // Re-run when the checked-out commit or the pinned version changes
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed={VERSION_VAR}");
}
