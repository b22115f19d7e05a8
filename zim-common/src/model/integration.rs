// zim-common/src/model/integration.rs
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One Add/Remove-Programs style record for an installed application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UninstallEntry {
    pub display_name: String,
    pub display_version: String,
    pub publisher: String,
    pub install_location: PathBuf,
    #[serde(default)]
    pub display_icon: String,
    #[serde(default)]
    pub estimated_size_kb: u64,
    /// Quoted uninstaller path; empty when no uninstaller was placed.
    #[serde(default)]
    pub uninstall_string: String,
    /// `YYYYMMDD`
    pub install_date: String,
    #[serde(default = "yes")]
    pub no_modify: bool,
    #[serde(default = "yes")]
    pub no_repair: bool,
}

fn yes() -> bool {
    true
}

/// Answer to "is this identity registered, and at which version?".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledVersion {
    pub installed: bool,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

impl InstalledVersion {
    pub fn not_installed() -> Self {
        Self::default()
    }
}
