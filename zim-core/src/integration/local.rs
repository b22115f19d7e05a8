// zim-core/src/integration/local.rs
//! File-backed host integration: a JSON uninstall registry under the state
//! directory, symlink shortcuts on Unix and `.url` shortcuts on Windows.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zim_common::config::{Config, UNINSTALLER_FILENAME};
use zim_common::error::{Result, ZimError};
use zim_common::model::{InstallManifest, InstalledVersion, UninstallEntry};

use super::SystemIntegration;

type Registry = BTreeMap<String, UninstallEntry>;

#[derive(Debug, Clone)]
pub struct LocalIntegration {
    config: Config,
}

impl LocalIntegration {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Every registered application, keyed by identity.
    pub fn entries(&self) -> Result<Vec<(String, UninstallEntry)>> {
        Ok(self.load_registry()?.into_iter().collect())
    }

    fn load_registry(&self) -> Result<Registry> {
        let path = self.config.registry_path();
        if !path.exists() {
            return Ok(Registry::new());
        }
        zim_aio::read_json(&path).map_err(|e| {
            ZimError::Integration(format!(
                "Uninstall registry {} is unreadable: {}",
                path.display(),
                e
            ))
        })
    }

    fn save_registry(&self, registry: &Registry) -> Result<()> {
        zim_aio::write_json(&self.config.registry_path(), registry)
    }
}

/// Registry record for `manifest`, mirroring what Add/Remove Programs shows.
pub fn uninstall_entry_for(manifest: &InstallManifest) -> UninstallEntry {
    let uninstaller = manifest.install_path.join(UNINSTALLER_FILENAME);
    let uninstall_string = if uninstaller.is_file() {
        format!("\"{}\"", uninstaller.display())
    } else {
        String::new()
    };
    UninstallEntry {
        display_name: manifest.display_name(),
        display_version: manifest.version.clone(),
        publisher: manifest.installed_by.clone(),
        install_location: manifest.install_path.clone(),
        display_icon: manifest.icon_path.clone(),
        estimated_size_kb: manifest.installed_size / 1024,
        uninstall_string,
        install_date: manifest.install_date.format("%Y%m%d").to_string(),
        no_modify: true,
        no_repair: true,
    }
}

impl SystemIntegration for LocalIntegration {
    fn create_shortcut(&self, target: &Path, link_path: &Path, working_dir: &Path, icon: &str) -> bool {
        match write_shortcut(target, link_path, working_dir, icon) {
            Ok(()) => {
                debug!("Created shortcut {} -> {}", link_path.display(), target.display());
                true
            }
            Err(e) => {
                warn!("Failed to create shortcut {}: {}", link_path.display(), e);
                false
            }
        }
    }

    fn remove_shortcut(&self, link_path: &Path) -> bool {
        match fs::remove_file(link_path) {
            Ok(()) => {
                debug!("Removed shortcut {}", link_path.display());
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!("Failed to remove shortcut {}: {}", link_path.display(), e);
                false
            }
        }
    }

    fn desktop_shortcut_path(&self, name: &str) -> PathBuf {
        self.config.desktop_shortcut_path(name)
    }

    fn start_menu_shortcut_path(&self, name: &str) -> PathBuf {
        self.config.start_menu_shortcut_path(name)
    }

    fn register_uninstall_entry(&self, manifest: &InstallManifest) -> Result<()> {
        let mut registry = self.load_registry()?;
        registry.insert(manifest.name.clone(), uninstall_entry_for(manifest));
        self.save_registry(&registry)?;
        debug!("Registered uninstall entry for {}", manifest.name);
        Ok(())
    }

    fn unregister_uninstall_entry(&self, identity: &str) -> Result<()> {
        let mut registry = self.load_registry()?;
        if registry.remove(identity).is_none() {
            debug!("No uninstall entry for {} to remove", identity);
            return Ok(());
        }
        self.save_registry(&registry)
    }

    fn query_installed_version(&self, identity: &str) -> InstalledVersion {
        match self.load_registry() {
            Ok(registry) => match registry.get(identity) {
                Some(entry) => InstalledVersion {
                    installed: true,
                    version: Some(entry.display_version.clone()),
                    path: Some(entry.install_location.clone()),
                },
                None => InstalledVersion::not_installed(),
            },
            Err(e) => {
                warn!("{}", e);
                InstalledVersion::not_installed()
            }
        }
    }
}

fn replace_existing(link_path: &Path) -> Result<()> {
    if let Some(parent) = link_path.parent() {
        zim_aio::fs::create_dir_all(parent)?;
    }
    if link_path.symlink_metadata().is_ok() {
        zim_aio::fs::remove_file(link_path)?;
    }
    Ok(())
}

#[cfg(unix)]
fn write_shortcut(target: &Path, link_path: &Path, _working_dir: &Path, _icon: &str) -> Result<()> {
    replace_existing(link_path)?;
    zim_aio::fs::create_symlink(target, link_path)
}

#[cfg(not(unix))]
fn write_shortcut(target: &Path, link_path: &Path, working_dir: &Path, icon: &str) -> Result<()> {
    replace_existing(link_path)?;
    let (icon_file, icon_index) = split_icon(icon);
    let content = format!(
        "[InternetShortcut]\r\nURL=file:///{}\r\nWorkingDirectory={}\r\nIconFile={}\r\nIconIndex={}\r\n",
        target.display().to_string().replace('\\', "/"),
        working_dir.display(),
        icon_file,
        icon_index
    );
    zim_aio::fs::atomic_write_file(link_path, content.as_bytes())
}

/// Splits a `path,index` icon reference. Quotes around the path are dropped.
#[cfg_attr(unix, allow(dead_code))]
fn split_icon(icon: &str) -> (String, u32) {
    match icon.rsplit_once(',') {
        Some((file, index)) => match index.trim().parse() {
            Ok(i) => (file.trim().trim_matches('"').to_string(), i),
            Err(_) => (icon.trim().trim_matches('"').to_string(), 0),
        },
        None => (icon.trim().trim_matches('"').to_string(), 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zim_common::model::ManifestSkeleton;

    fn manifest_in(dir: &Path, version: &str) -> InstallManifest {
        let mut skeleton = ManifestSkeleton::new("Tool", "tool.exe");
        skeleton.version = version.to_string();
        skeleton.installed_by = "Acme".to_string();
        skeleton.into_manifest(dir, vec!["tool.exe".to_string()], 4096)
    }

    #[test]
    fn register_query_unregister() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::with_root(tmp.path());
        let integration = LocalIntegration::new(&config);
        let install_dir = tmp.path().join("Programs/Tool");
        fs::create_dir_all(&install_dir).unwrap();
        fs::write(install_dir.join(UNINSTALLER_FILENAME), b"x").unwrap();

        assert!(!integration.query_installed_version("Tool").installed);
        integration
            .register_uninstall_entry(&manifest_in(&install_dir, "2.5.0.1"))
            .unwrap();

        let installed = integration.query_installed_version("Tool");
        assert!(installed.installed);
        assert_eq!(installed.version.as_deref(), Some("2.5.0.1"));
        assert_eq!(installed.path.as_deref(), Some(install_dir.as_path()));

        let entries = integration.entries().unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0].1;
        assert_eq!(entry.display_name, "Tool 2.5.0.1");
        assert_eq!(entry.publisher, "Acme");
        assert_eq!(entry.estimated_size_kb, 4);
        assert!(entry.uninstall_string.starts_with('"'));
        assert_eq!(entry.install_date.len(), 8);

        integration.unregister_uninstall_entry("Tool").unwrap();
        assert!(!integration.query_installed_version("Tool").installed);
        integration.unregister_uninstall_entry("Tool").unwrap();
    }

    #[test]
    fn missing_uninstaller_leaves_uninstall_string_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let entry = uninstall_entry_for(&manifest_in(tmp.path(), "1.0.0.0"));
        assert!(entry.uninstall_string.is_empty());
        assert_eq!(entry.display_name, "Tool");
    }

    #[test]
    fn corrupt_registry_reports_not_installed() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::with_root(tmp.path());
        fs::create_dir_all(config.state_dir()).unwrap();
        fs::write(config.registry_path(), b"{ not json").unwrap();
        let integration = LocalIntegration::new(&config);
        assert!(!integration.query_installed_version("Tool").installed);
        assert!(matches!(integration.entries(), Err(ZimError::Integration(_))));
    }

    #[cfg(unix)]
    #[test]
    fn shortcuts_are_symlinks_and_replaceable() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::with_root(tmp.path());
        let integration = LocalIntegration::new(&config);
        let target = tmp.path().join("tool.exe");
        fs::write(&target, b"MZ").unwrap();
        let link = integration.desktop_shortcut_path("Tool");

        assert!(integration.create_shortcut(&target, &link, tmp.path(), ""));
        assert!(integration.create_shortcut(&target, &link, tmp.path(), ""));
        assert_eq!(fs::read_link(&link).unwrap(), target);

        assert!(integration.remove_shortcut(&link));
        assert!(link.symlink_metadata().is_err());
        assert!(integration.remove_shortcut(&link));
    }

    #[test]
    fn icon_reference_is_split() {
        assert_eq!(split_icon("\"C:/x/app.exe\",0"), ("C:/x/app.exe".to_string(), 0));
        assert_eq!(split_icon("/opt/app/app.exe,2"), ("/opt/app/app.exe".to_string(), 2));
        assert_eq!(split_icon(""), (String::new(), 0));
    }
}
