//! Host precondition checks run before the core dependencies are installed.
use crate::error::CapabilityError;
use crate::exec::Executor;
use crate::platform::{OsFamily, Platform, Release};

/// Kernel attribute holding the running kernel's configuration text.
const KERNEL_CONFIG_SYSCTL: &str = "kern.conftxt";

/// A precondition a family must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The running kernel must be built with `options <feature>`.
    KernelFeature {
        /// Kernel option name.
        feature: &'static str,
        /// Sample kernel configuration, relative to the source root.
        sample: &'static str,
    },
    /// The host release must be at least this.
    ReleaseFloor(Release),
}

/// Requirements checked for `family`.
///
/// FreeBSD nodes are jails with their own network stack, which needs
/// VIMAGE; OpenBSD nodes are routing domains joined by `pair(4)`
/// interfaces, which first shipped in 6.1.
#[must_use]
pub const fn requirements(family: OsFamily) -> &'static [Requirement] {
    const FREEBSD: &[Requirement] = &[Requirement::KernelFeature {
        feature: "VIMAGE",
        sample: "util/freebsd/VIMAGE",
    }];
    const OPENBSD: &[Requirement] = &[Requirement::ReleaseFloor(Release::new(6, 1))];
    match family {
        OsFamily::FreeBsd => FREEBSD,
        OsFamily::OpenBsd => OPENBSD,
    }
}

/// Verify every requirement of the host platform.
///
/// # Errors
///
/// Returns the first unmet requirement as a [`CapabilityError`].
pub fn check(platform: &Platform, executor: &dyn Executor) -> Result<(), CapabilityError> {
    for requirement in requirements(platform.family) {
        match *requirement {
            Requirement::KernelFeature { feature, sample } => {
                check_kernel_feature(executor, feature, sample)?;
            }
            Requirement::ReleaseFloor(floor) => check_release_floor(platform.release, floor)?,
        }
    }
    Ok(())
}

/// Fail if `detected` is strictly below `floor`.
///
/// # Errors
///
/// Returns [`CapabilityError::ReleaseTooOld`] naming both releases.
pub fn check_release_floor(detected: Release, floor: Release) -> Result<(), CapabilityError> {
    if detected < floor {
        return Err(CapabilityError::ReleaseTooOld { detected, floor });
    }
    Ok(())
}

fn check_kernel_feature(
    executor: &dyn Executor,
    feature: &str,
    sample: &str,
) -> Result<(), CapabilityError> {
    let query_failed = |reason: String| CapabilityError::QueryFailed {
        attribute: KERNEL_CONFIG_SYSCTL.to_string(),
        reason,
    };
    let result = executor
        .run_unchecked("sysctl", &["-n", KERNEL_CONFIG_SYSCTL])
        .map_err(|e| query_failed(format!("{e:#}")))?;
    if !result.success {
        return Err(query_failed(result.stderr.trim().to_string()));
    }
    if kernel_has_option(&result.stdout, feature) {
        Ok(())
    } else {
        Err(CapabilityError::MissingKernelFeature {
            feature: feature.to_string(),
            sample: sample.to_string(),
        })
    }
}

/// Whether a kernel configuration dump contains `options <feature>`.
fn kernel_has_option(conftxt: &str, feature: &str) -> bool {
    conftxt.lines().any(|line| {
        let mut words = line.split_whitespace();
        words.next() == Some("options") && words.next() == Some(feature)
    })
}
