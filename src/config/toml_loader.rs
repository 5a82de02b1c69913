//! TOML override file parsing.
//!
//! The file has one optional table per family. Every key is optional; a key
//! that is present replaces the built-in value wholesale.
//!
//! ```toml
//! [freebsd]
//! dependencies = ["python3", "socat", "gmake"]
//!
//! [freebsd.host_config]
//! settings = [{ key = "if_epair_load", value = "YES" }]
//!
//! [freebsd.controller]
//! enabled = false
//! ```
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{Config, ControllerSpec, HostConfig, ServiceSpec};
use crate::error::ConfigError;
use crate::platform::OsFamily;

/// Root of the override file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    freebsd: Option<FamilyOverrides>,
    #[serde(default)]
    openbsd: Option<FamilyOverrides>,
}

impl ConfigFile {
    /// The table for `family`, if the file has one.
    #[must_use]
    pub const fn for_family(&self, family: OsFamily) -> Option<&FamilyOverrides> {
        match family {
            OsFamily::FreeBsd => self.freebsd.as_ref(),
            OsFamily::OpenBsd => self.openbsd.as_ref(),
        }
    }
}

/// Overrides for one family.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyOverrides {
    dependencies: Option<Vec<String>>,
    package_files: Option<Vec<PathBuf>>,
    build_install: Option<Vec<String>>,
    build_uninstall: Option<Vec<String>>,
    install_dir: Option<PathBuf>,
    host_config: Option<HostConfigOverrides>,
    vswitch: Option<ServiceOverrides>,
    controller: Option<ControllerOverrides>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct HostConfigOverrides {
    enabled: Option<bool>,
    path: Option<PathBuf>,
    settings: Option<Vec<SettingEntry>>,
}

/// One `key=value` line; entries keep the order they are written in.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingEntry {
    key: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServiceOverrides {
    enabled: Option<bool>,
    packages: Option<Vec<String>>,
    daemons: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ControllerOverrides {
    enabled: Option<bool>,
    packages: Option<Vec<String>>,
    repository: Option<String>,
    directory: Option<String>,
    build: Option<Vec<String>>,
}

/// Read and parse the override file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if it is not valid TOML or has unknown keys.
pub fn load(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&content).map_err(|message| ConfigError::Parse {
        path: path.display().to_string(),
        message,
    })
}

fn parse(content: &str) -> Result<ConfigFile, String> {
    toml::from_str(content).map_err(|e| e.message().to_string())
}

fn replace<T>(target: &mut T, value: Option<&T>)
where
    T: Clone,
{
    if let Some(v) = value {
        v.clone_into(target);
    }
}

impl FamilyOverrides {
    /// Apply these overrides to `config`.
    ///
    /// # Errors
    ///
    /// Returns a message if a sub-table enables a component that has no
    /// default and omits a required key.
    pub fn apply(&self, config: &mut Config) -> Result<(), String> {
        replace(&mut config.dependencies, self.dependencies.as_ref());
        replace(&mut config.package_files, self.package_files.as_ref());
        replace(&mut config.build_install, self.build_install.as_ref());
        replace(&mut config.build_uninstall, self.build_uninstall.as_ref());
        replace(&mut config.install_dir, self.install_dir.as_ref());

        if let Some(o) = &self.host_config {
            config.host_config = o.apply(config.host_config.take())?;
        }
        if let Some(o) = &self.vswitch {
            config.vswitch = o.apply(config.vswitch.take());
        }
        if let Some(o) = &self.controller {
            config.controller = o.apply(config.controller.take())?;
        }
        Ok(())
    }
}

impl HostConfigOverrides {
    fn apply(&self, base: Option<HostConfig>) -> Result<Option<HostConfig>, String> {
        if self.enabled == Some(false) {
            return Ok(None);
        }
        let mut host = match (base, &self.path) {
            (Some(host), _) => host,
            (None, Some(path)) => HostConfig {
                path: path.clone(),
                settings: Vec::new(),
            },
            (None, None) => return Err("host_config.path is required".to_string()),
        };
        replace(&mut host.path, self.path.as_ref());
        if let Some(settings) = &self.settings {
            host.settings = settings
                .iter()
                .map(|entry| (entry.key.clone(), entry.value.clone()))
                .collect();
        }
        Ok(Some(host))
    }
}

impl ServiceOverrides {
    fn apply(&self, base: Option<ServiceSpec>) -> Option<ServiceSpec> {
        if self.enabled == Some(false) {
            return None;
        }
        let mut service = base.unwrap_or_default();
        replace(&mut service.packages, self.packages.as_ref());
        replace(&mut service.daemons, self.daemons.as_ref());
        (!service.packages.is_empty() || !service.daemons.is_empty()).then_some(service)
    }
}

impl ControllerOverrides {
    fn apply(&self, base: Option<ControllerSpec>) -> Result<Option<ControllerSpec>, String> {
        if self.enabled == Some(false) {
            return Ok(None);
        }
        let mut controller = match (base, &self.repository) {
            (Some(controller), _) => controller,
            (None, Some(repository)) => ControllerSpec {
                packages: Vec::new(),
                repository: repository.clone(),
                directory: default_checkout_name(repository),
                build: Vec::new(),
            },
            (None, None) => return Err("controller.repository is required".to_string()),
        };
        replace(&mut controller.packages, self.packages.as_ref());
        replace(&mut controller.repository, self.repository.as_ref());
        replace(&mut controller.directory, self.directory.as_ref());
        replace(&mut controller.build, self.build.as_ref());
        Ok(Some(controller))
    }
}

/// Checkout directory `git clone` would pick for `url`.
fn default_checkout_name(url: &str) -> String {
    let last = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}
