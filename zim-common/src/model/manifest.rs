// zim-common/src/model/manifest.rs
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_MANIFEST_VERSION, TOOL_NAME};

fn default_version() -> String {
    DEFAULT_MANIFEST_VERSION.to_string()
}

fn default_installed_by() -> String {
    TOOL_NAME.to_string()
}

/// Record of one installed application, persisted as `install_info.json` in
/// the directory it describes. Uninstallation trusts nothing else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallManifest {
    pub name: String,
    pub executable: String,
    pub install_date: NaiveDateTime,
    pub install_path: PathBuf,
    #[serde(default = "default_version")]
    pub version: String,
    /// Falls back to `name` when absent.
    #[serde(default)]
    pub product_name: String,
    #[serde(default = "default_installed_by")]
    pub installed_by: String,
    #[serde(default)]
    pub icon_path: String,
    #[serde(default)]
    pub installed_size: u64,
    /// Paths relative to `install_path`, `/`-separated, in the order they were written.
    #[serde(default)]
    pub installed_files: Vec<String>,
}

impl InstallManifest {
    /// Fills fields that older or hand-edited manifests may leave blank.
    pub fn normalized(mut self) -> Self {
        if self.product_name.trim().is_empty() {
            self.product_name = self.name.clone();
        }
        if self.version.trim().is_empty() {
            self.version = default_version();
        }
        self.installed_files = self
            .installed_files
            .into_iter()
            .map(|f| normalize_relative(&f))
            .collect();
        self
    }

    pub fn executable_path(&self) -> PathBuf {
        self.install_path.join(&self.executable)
    }

    pub fn original_files(&self) -> HashSet<String> {
        self.installed_files.iter().cloned().collect()
    }

    /// Name shown in the uninstall registry: the placeholder version is omitted.
    pub fn display_name(&self) -> String {
        if self.version.is_empty() || self.version == DEFAULT_MANIFEST_VERSION {
            self.product_name.clone()
        } else {
            format!("{} {}", self.product_name, self.version)
        }
    }
}

/// Everything the caller decides about an install before any file is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSkeleton {
    pub name: String,
    pub executable: String,
    pub version: String,
    pub product_name: String,
    pub installed_by: String,
    pub icon_path: String,
}

impl ManifestSkeleton {
    pub fn new(name: impl Into<String>, executable: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            product_name: name.clone(),
            name,
            executable: executable.into(),
            version: default_version(),
            installed_by: default_installed_by(),
            icon_path: String::new(),
        }
    }

    pub fn into_manifest(
        self,
        install_path: &Path,
        installed_files: Vec<String>,
        installed_size: u64,
    ) -> InstallManifest {
        InstallManifest {
            name: self.name,
            executable: normalize_relative(&self.executable),
            install_date: Local::now().naive_local(),
            install_path: install_path.to_path_buf(),
            version: self.version,
            product_name: self.product_name,
            installed_by: self.installed_by,
            icon_path: self.icon_path,
            installed_size,
            installed_files,
        }
        .normalized()
    }
}

/// Converts `\` separators to `/` and drops leading `./` and `/`.
pub fn normalize_relative(path: &str) -> String {
    let replaced = path.replace('\\', "/");
    let mut trimmed = replaced.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.trim_start_matches('/').to_string()
}

/// Relative path of `path` below `root` in manifest form, if it is below `root`.
pub fn relative_manifest_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_fields_are_defaulted() {
        let json = r#"{
            "name": "Tool",
            "executable": "tool.exe",
            "install_date": "2024-05-01T10:20:30.123456",
            "install_path": "/opt/tool",
            "some_future_key": 42
        }"#;
        let manifest: InstallManifest = serde_json::from_str(json).unwrap();
        let manifest = manifest.normalized();
        assert_eq!(manifest.version, "1.0.0.0");
        assert_eq!(manifest.product_name, "Tool");
        assert_eq!(manifest.installed_by, TOOL_NAME);
        assert!(manifest.installed_files.is_empty());
        assert_eq!(manifest.installed_size, 0);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let json = r#"{ "name": "Tool", "install_date": "2024-05-01T10:20:30", "install_path": "/x" }"#;
        assert!(serde_json::from_str::<InstallManifest>(json).is_err());
    }

    #[test]
    fn display_name_hides_placeholder_version() {
        let mut manifest =
            ManifestSkeleton::new("Tool", "tool.exe").into_manifest(Path::new("/x"), vec![], 0);
        assert_eq!(manifest.display_name(), "Tool");
        manifest.version = "2.1".to_string();
        assert_eq!(manifest.display_name(), "Tool 2.1");
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        assert_eq!(normalize_relative(r"data\readme.txt"), "data/readme.txt");
        assert_eq!(normalize_relative("./app.exe"), "app.exe");
        let root = Path::new("/opt/app");
        assert_eq!(
            relative_manifest_path(root, &root.join("data").join("x.txt")).as_deref(),
            Some("data/x.txt")
        );
        assert_eq!(relative_manifest_path(root, root), None);
    }
}
