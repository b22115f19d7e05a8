// zim-core/src/install/mod.rs
use std::path::PathBuf;

use zim_common::model::{InstallManifest, ManifestSkeleton};

pub mod engine;
pub mod extract;
pub mod manifest;

pub use engine::InstallationEngine;
pub use manifest::{read_manifest, write_manifest};

/// Everything needed to place one archive on disk.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub archive_path: PathBuf,
    pub install_dir: PathBuf,
    pub extraction_root: Option<String>,
    pub skeleton: ManifestSkeleton,
    pub create_desktop_shortcut: bool,
    pub create_start_menu_shortcut: bool,
}

#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub manifest: InstallManifest,
    /// Integration steps that failed without failing the install.
    pub warnings: Vec<String>,
}

impl InstallOutcome {
    pub fn install_path(&self) -> &std::path::Path {
        &self.manifest.install_path
    }
}
