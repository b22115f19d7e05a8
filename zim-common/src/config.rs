// zim-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, UserDirs};
use tracing::debug;

use super::error::{Result, ZimError};

/// Identity under which the tool registers its own installation.
pub const TOOL_NAME: &str = "zim";
/// Manifest file written into every install directory.
pub const MANIFEST_FILENAME: &str = "install_info.json";
/// Suffix that marks an archive entry as a launchable program.
pub const EXECUTABLE_SUFFIX: &str = ".exe";

#[cfg(windows)]
pub const UNINSTALLER_FILENAME: &str = "uninstall.exe";
#[cfg(not(windows))]
pub const UNINSTALLER_FILENAME: &str = "uninstall";

#[cfg(windows)]
pub const SELF_EXECUTABLE_FILENAME: &str = "zim.exe";
#[cfg(not(windows))]
pub const SELF_EXECUTABLE_FILENAME: &str = "zim";

/// Placeholder version written when the archive carries no version metadata.
pub const DEFAULT_MANIFEST_VERSION: &str = "1.0.0.0";

const REGISTRY_FILENAME: &str = "uninstall_registry.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub zim_root: PathBuf,
    pub programs_dir: PathBuf,
    pub desktop_dir: PathBuf,
    pub start_menu_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading zim configuration");

        let base_dirs = BaseDirs::new().ok_or_else(|| {
            ZimError::Config("Could not determine the user's home directory".to_string())
        })?;
        let data_local = base_dirs.data_local_dir().to_path_buf();

        let zim_root = env_path("ZIM_ROOT").unwrap_or_else(|| data_local.join(TOOL_NAME));
        let programs_dir =
            env_path("ZIM_PROGRAMS_DIR").unwrap_or_else(|| data_local.join("Programs"));

        let desktop_dir = env_path("ZIM_DESKTOP_DIR").unwrap_or_else(|| {
            UserDirs::new()
                .and_then(|ud| ud.desktop_dir().map(Path::to_path_buf))
                .unwrap_or_else(|| base_dirs.home_dir().join("Desktop"))
        });

        let start_menu_dir = env_path("ZIM_START_MENU_DIR").unwrap_or_else(|| {
            if cfg!(windows) {
                base_dirs
                    .config_dir()
                    .join("Microsoft")
                    .join("Windows")
                    .join("Start Menu")
                    .join("Programs")
            } else {
                data_local.join("applications")
            }
        });

        debug!("Effective ZIM_ROOT set to: {}", zim_root.display());
        debug!("Configuration loaded successfully.");
        Ok(Self {
            zim_root,
            programs_dir,
            desktop_dir,
            start_menu_dir,
        })
    }

    /// Builds a configuration whose every directory lives under `root`.
    pub fn with_root(root: &Path) -> Self {
        Self {
            zim_root: root.join("zim"),
            programs_dir: root.join("Programs"),
            desktop_dir: root.join("Desktop"),
            start_menu_dir: root.join("StartMenu"),
        }
    }

    pub fn zim_root(&self) -> &Path {
        &self.zim_root
    }

    pub fn programs_dir(&self) -> &Path {
        &self.programs_dir
    }

    pub fn state_dir(&self) -> PathBuf {
        self.zim_root.join("state")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.zim_root.join("logs")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.state_dir().join(REGISTRY_FILENAME)
    }

    pub fn version_file_path(&self) -> PathBuf {
        self.state_dir().join("version.json")
    }

    /// Default install directory for an application with the given display name.
    pub fn app_install_dir(&self, name: &str) -> PathBuf {
        self.programs_dir.join(name)
    }

    /// Fixed location the tool installs itself into.
    pub fn self_install_dir(&self) -> PathBuf {
        self.app_install_dir(TOOL_NAME)
    }

    pub fn desktop_shortcut_path(&self, name: &str) -> PathBuf {
        self.desktop_dir.join(shortcut_file_name(name))
    }

    pub fn start_menu_shortcut_path(&self, name: &str) -> PathBuf {
        self.start_menu_dir.join(shortcut_file_name(name))
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var(var).ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

#[cfg(windows)]
fn shortcut_file_name(name: &str) -> String {
    format!("{name}.url")
}

#[cfg(not(windows))]
fn shortcut_file_name(name: &str) -> String {
    name.to_string()
}
