//! Built-in manifests for each supported family.
use std::path::{Path, PathBuf};

use super::{Config, ControllerSpec, HostConfig, ServiceSpec};
use crate::platform::OsFamily;

const FREEBSD_DEPENDENCIES: &[&str] = &[
    "python3",
    "py311-setuptools",
    "py311-pexpect",
    "py311-pyflakes",
    "py311-pylint",
    "py311-pycodestyle",
    "help2man",
    "socat",
    "iperf",
    "gmake",
];

const OPENBSD_DEPENDENCIES: &[&str] = &[
    "python%3",
    "py3-setuptools",
    "py3-pexpect",
    "py3-flakes",
    "pylint",
    "py3-codestyle",
    "help2man",
    "socat",
    "iperf",
    "gmake",
];

/// Kernel modules loaded at boot so bridges and epair links are available
/// before the first run.
const FREEBSD_LOADER_CONF: &str = "/boot/loader.conf.d/mininet.conf";
const FREEBSD_LOADER_SETTINGS: &[(&str, &str)] =
    &[("if_bridge_load", "YES"), ("if_epair_load", "YES")];

const RYU_REPOSITORY: &str = "https://github.com/faucetsdn/ryu.git";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// Default manifest for `family` with the source tree at `root`.
///
/// Third-party sources land next to the source tree, i.e. in the parent of
/// `root`, or in `root` itself when it has no parent.
#[must_use]
pub fn for_family(family: OsFamily, root: &Path) -> Config {
    let install_dir = root
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| root.to_path_buf(), Path::to_path_buf);

    let common = Config {
        dependencies: Vec::new(),
        package_files: Vec::<PathBuf>::new(),
        build_install: strings(&["gmake", "install"]),
        build_uninstall: strings(&["gmake", "uninstall"]),
        install_dir,
        host_config: None,
        vswitch: None,
        controller: None,
    };

    match family {
        OsFamily::FreeBsd => Config {
            dependencies: strings(FREEBSD_DEPENDENCIES),
            host_config: Some(HostConfig {
                path: PathBuf::from(FREEBSD_LOADER_CONF),
                settings: FREEBSD_LOADER_SETTINGS
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            }),
            vswitch: Some(ServiceSpec {
                packages: strings(&["openvswitch"]),
                daemons: strings(&["ovsdb-server", "ovs-vswitchd"]),
            }),
            controller: Some(ControllerSpec {
                packages: strings(&["git", "py311-pip"]),
                repository: RYU_REPOSITORY.to_string(),
                directory: "ryu".to_string(),
                build: strings(&["python3", "-m", "pip", "install", "."]),
            }),
            ..common
        },
        OsFamily::OpenBsd => Config {
            dependencies: strings(OPENBSD_DEPENDENCIES),
            ..common
        },
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn every_family_builds_the_core_with_gmake() {
        for family in OsFamily::ALL {
            let config = for_family(family, Path::new("/src/mininet"));
            assert_eq!(config.build_install, vec!["gmake", "install"]);
            assert_eq!(config.build_uninstall, vec!["gmake", "uninstall"]);
            assert!(config.dependencies.contains(&"gmake".to_string()));
        }
    }

    #[test]
    fn install_dir_is_parent_of_root() {
        let config = for_family(OsFamily::FreeBsd, Path::new("/src/mininet"));
        assert_eq!(config.install_dir, PathBuf::from("/src"));
    }

    #[test]
    fn install_dir_falls_back_to_root() {
        let config = for_family(OsFamily::FreeBsd, Path::new("/"));
        assert_eq!(config.install_dir, PathBuf::from("/"));
        let config = for_family(OsFamily::FreeBsd, Path::new("mininet"));
        assert_eq!(config.install_dir, PathBuf::from("mininet"));
    }

    #[test]
    fn freebsd_has_optional_components() {
        let config = for_family(OsFamily::FreeBsd, Path::new("/src/mininet"));
        let host = config.host_config.unwrap();
        assert_eq!(host.path, PathBuf::from(FREEBSD_LOADER_CONF));
        assert_eq!(host.settings.len(), 2);
        assert_eq!(config.vswitch.unwrap().daemons.len(), 2);
        assert_eq!(config.controller.unwrap().directory, "ryu");
    }

    #[test]
    fn openbsd_has_no_optional_components() {
        let config = for_family(OsFamily::OpenBsd, Path::new("/src/mininet"));
        assert!(config.host_config.is_none());
        assert!(config.vswitch.is_none());
        assert!(config.controller.is_none());
        assert!(config.dependencies.contains(&"python%3".to_string()));
    }
}
