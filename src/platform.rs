//! Host platform detection.
use std::fmt;
use std::str::FromStr;

use crate::error::PlatformError;
use crate::exec::Executor;

/// Supported host operating system families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    /// FreeBSD; nodes are VIMAGE jails.
    FreeBsd,
    /// OpenBSD; nodes are routing domains.
    OpenBsd,
}

impl OsFamily {
    /// Every family the installer knows how to provision.
    pub const ALL: [Self; 2] = [Self::FreeBsd, Self::OpenBsd];

    /// Map a `uname -s` value to a supported family.
    #[must_use]
    pub fn from_uname(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.uname() == name.trim())
    }

    /// The `uname -s` string reported by this family.
    #[must_use]
    pub const fn uname(self) -> &'static str {
        match self {
            Self::FreeBsd => "FreeBSD",
            Self::OpenBsd => "OpenBSD",
        }
    }

    /// Name of the family's table in the override file.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::FreeBsd => "freebsd",
            Self::OpenBsd => "openbsd",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uname())
    }
}

/// Host release as a comparable `major.minor` ordinal.
///
/// Parsed from `uname -r`; anything after the first `-` (`RELEASE`,
/// `CURRENT`, `p3`, …) is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Release {
    /// Major version.
    pub major: u32,
    /// Minor version; `0` when `uname -r` has none.
    pub minor: u32,
}

impl Release {
    /// Release `major.minor`.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Release {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PlatformError::DetectionFailed(format!("unrecognised release '{s}'"));
        let version = s.trim().split('-').next().unwrap_or_default();
        let mut parts = version.split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let minor = match parts.next() {
            Some(p) => p.parse().map_err(|_| invalid())?,
            None => 0,
        };
        Ok(Self { major, minor })
    }
}

/// Platform information for the current host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Operating system family.
    pub family: OsFamily,
    /// Running release.
    pub release: Release,
}

impl Platform {
    /// Platform for `family` at `release`.
    #[must_use]
    pub const fn new(family: OsFamily, release: Release) -> Self {
        Self { family, release }
    }

    /// Detect the host platform via `uname`.
    ///
    /// Nothing else is run before the family is confirmed, so an unsupported
    /// host never sees a package operation.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Unsupported`] for an OS family other than
    /// FreeBSD or OpenBSD, and [`PlatformError::DetectionFailed`] if `uname`
    /// fails or reports an unparseable release.
    pub fn detect(executor: &dyn Executor) -> Result<Self, PlatformError> {
        let name = uname(executor, "-s")?;
        let family = OsFamily::from_uname(&name).ok_or_else(|| PlatformError::unsupported(&name))?;
        let release = uname(executor, "-r")?.parse()?;
        Ok(Self { family, release })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.release)
    }
}

fn uname(executor: &dyn Executor, flag: &str) -> Result<String, PlatformError> {
    let result = executor
        .run("uname", &[flag])
        .map_err(|e| PlatformError::DetectionFailed(format!("{e:#}")))?;
    Ok(result.stdout.trim().to_string())
}
