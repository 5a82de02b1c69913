//! Sanity checks on a loaded manifest.
//!
//! Problems found here are reported as warnings; the run still proceeds and
//! the failing collaborator reports the real error.
use super::Config;
use crate::operations::FileSystemOps;

/// A validation warning detected after configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Manifest section (e.g., "dependencies", "controller").
    pub section: String,
    /// The specific item that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Warning about `item` in `section`.
    #[must_use]
    pub fn new(
        section: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            section: section.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.section, self.item, self.message)
    }
}

fn check_names(section: &str, names: &[String], warnings: &mut Vec<ValidationWarning>) {
    for name in names {
        if name.trim().is_empty() {
            warnings.push(ValidationWarning::new(section, name, "package name is empty"));
        } else if name.starts_with('-') {
            warnings.push(ValidationWarning::new(
                section,
                name,
                "package name looks like a flag",
            ));
        }
    }
}

fn check_command(section: &str, command: &[String], warnings: &mut Vec<ValidationWarning>) {
    if command.first().is_none_or(|p| p.trim().is_empty()) {
        warnings.push(ValidationWarning::new(section, "command", "command is empty"));
    }
}

impl Config {
    /// Check the manifest for mistakes that would only surface mid-run.
    #[must_use]
    pub fn validate(&self, fs: &dyn FileSystemOps) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        check_names("dependencies", &self.dependencies, &mut warnings);
        check_command("build_install", &self.build_install, &mut warnings);
        check_command("build_uninstall", &self.build_uninstall, &mut warnings);

        for file in &self.package_files {
            if !fs.exists(file) {
                warnings.push(ValidationWarning::new(
                    "package_files",
                    file.display().to_string(),
                    "package file does not exist",
                ));
            }
        }

        if let Some(host) = &self.host_config {
            let path = host.path.display().to_string();
            if !host.path.is_absolute() {
                warnings.push(ValidationWarning::new(
                    "host_config",
                    &path,
                    "path should be absolute",
                ));
            }
            if host.settings.is_empty() {
                warnings.push(ValidationWarning::new(
                    "host_config",
                    &path,
                    "no settings; the file will be written empty",
                ));
            }
        }

        if let Some(vswitch) = &self.vswitch {
            check_names("vswitch", &vswitch.packages, &mut warnings);
        }

        if let Some(controller) = &self.controller {
            check_names("controller", &controller.packages, &mut warnings);
            check_command("controller", &controller.build, &mut warnings);
            if controller.directory.contains('/') || controller.directory.is_empty() {
                warnings.push(ValidationWarning::new(
                    "controller",
                    &controller.directory,
                    "directory should be a single path component",
                ));
            }
        }

        warnings
    }
}
