//! Per-platform installation manifest.
//!
//! A [`Config`] starts from the built-in defaults for the detected family
//! ([`defaults::for_family`]) and is then overridden by the family's table in
//! an optional TOML file (see [`toml_loader`]).
pub mod defaults;
pub mod toml_loader;
pub mod validation;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::platform::Platform;

/// Config file looked up under the source root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "util/install.toml";

/// Everything the tasks need to know about what to install on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Native packages required to build and run the core.
    pub dependencies: Vec<String>,
    /// Local package files installed one by one after the bulk install.
    pub package_files: Vec<PathBuf>,
    /// Build tool invocation that installs the core from the source root.
    pub build_install: Vec<String>,
    /// Build tool invocation that uninstalls the core.
    pub build_uninstall: Vec<String>,
    /// Directory under which third-party sources are fetched.
    pub install_dir: PathBuf,
    /// Host configuration file placed by the dependency task.
    pub host_config: Option<HostConfig>,
    /// Optional virtual switch service.
    pub vswitch: Option<ServiceSpec>,
    /// Optional SDN controller.
    pub controller: Option<ControllerSpec>,
}

/// A `key=value` configuration file owned by the installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// File the settings are written to.
    pub path: PathBuf,
    /// Settings in the order they are written.
    pub settings: Vec<(String, String)>,
}

/// Packages and daemons of an optional service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSpec {
    /// Native packages providing the service.
    pub packages: Vec<String>,
    /// Daemons started in order after the packages are installed.
    pub daemons: Vec<String>,
}

/// How to obtain and build the SDN controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSpec {
    /// Native packages needed to fetch and build the controller.
    pub packages: Vec<String>,
    /// VCS URL cloned into [`Config::install_dir`].
    pub repository: String,
    /// Checkout directory name under [`Config::install_dir`].
    pub directory: String,
    /// Build command run inside the checkout.
    pub build: Vec<String>,
}

impl Config {
    /// Load the manifest for `platform`.
    ///
    /// Reads `explicit` if given, otherwise [`DEFAULT_CONFIG_FILE`] under
    /// `root` when it exists. Relative package file paths are resolved
    /// against `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if an explicit file is missing or any file
    /// cannot be read, and [`ConfigError::Parse`] if it is not valid.
    pub fn load(
        root: &Path,
        platform: &Platform,
        explicit: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = defaults::for_family(platform.family, root);

        let path = explicit.map_or_else(|| root.join(DEFAULT_CONFIG_FILE), Path::to_path_buf);
        if explicit.is_none() && !path.exists() {
            return Ok(config);
        }

        let file = toml_loader::load(&path)?;
        if let Some(overrides) = file.for_family(platform.family) {
            overrides
                .apply(&mut config)
                .map_err(|message| ConfigError::Parse {
                    path: path.display().to_string(),
                    message: format!("[{}] {message}", platform.family.key()),
                })?;
        }

        config.package_files = config
            .package_files
            .into_iter()
            .map(|p| if p.is_relative() { root.join(p) } else { p })
            .collect();

        Ok(config)
    }

    /// Controller checkout directory.
    #[must_use]
    pub fn controller_dir(&self, controller: &ControllerSpec) -> PathBuf {
        self.install_dir.join(&controller.directory)
    }
}
