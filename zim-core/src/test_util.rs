// zim-core/src/test_util.rs
//! Fixtures shared by the unit tests of this crate.
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use zim_common::error::{Result, ZimError};
use zim_common::model::{InstallManifest, InstalledVersion};
use zim_common::pipeline::PipelineEvent;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::integration::{DeferredDeleter, SystemIntegration};

/// Writes `entries` into a new archive. Names ending in `/` become directory entries.
pub fn write_zip(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (entry, content) in entries {
        if entry.ends_with('/') {
            writer.add_directory(*entry, options).unwrap();
        } else {
            writer.start_file(*entry, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap();
    path
}

/// Stand-in for the running program, placed outside any install directory.
pub fn fake_running_exe(dir: &Path) -> PathBuf {
    let path = dir.join("zim-under-test");
    std::fs::write(&path, b"running binary").unwrap();
    path
}

pub fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<PipelineEvent>) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn progress_values(events: &[PipelineEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::Progress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect()
}

/// Records every call; shortcut and registry operations succeed unless told otherwise.
#[derive(Default)]
pub struct RecordingIntegration {
    pub fail_everything: bool,
    pub installed: Mutex<Option<InstalledVersion>>,
    pub shortcuts_created: Mutex<Vec<PathBuf>>,
    pub shortcuts_removed: Mutex<Vec<PathBuf>>,
    pub registered: Mutex<Vec<InstallManifest>>,
    pub unregistered: Mutex<Vec<String>>,
    pub shortcut_root: PathBuf,
}

impl RecordingIntegration {
    pub fn new(shortcut_root: &Path) -> Self {
        Self {
            shortcut_root: shortcut_root.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn failing(shortcut_root: &Path) -> Self {
        Self {
            fail_everything: true,
            ..Self::new(shortcut_root)
        }
    }

    pub fn with_installed(self, version: &str, path: &Path) -> Self {
        *self.installed.lock().unwrap() = Some(InstalledVersion {
            installed: true,
            version: Some(version.to_string()),
            path: Some(path.to_path_buf()),
        });
        self
    }
}

impl SystemIntegration for RecordingIntegration {
    fn create_shortcut(&self, _target: &Path, link_path: &Path, _working_dir: &Path, _icon: &str) -> bool {
        if self.fail_everything {
            return false;
        }
        self.shortcuts_created.lock().unwrap().push(link_path.to_path_buf());
        true
    }

    fn remove_shortcut(&self, link_path: &Path) -> bool {
        if self.fail_everything {
            return false;
        }
        self.shortcuts_removed.lock().unwrap().push(link_path.to_path_buf());
        true
    }

    fn desktop_shortcut_path(&self, name: &str) -> PathBuf {
        self.shortcut_root.join("desktop").join(name)
    }

    fn start_menu_shortcut_path(&self, name: &str) -> PathBuf {
        self.shortcut_root.join("start_menu").join(name)
    }

    fn register_uninstall_entry(&self, manifest: &InstallManifest) -> Result<()> {
        if self.fail_everything {
            return Err(ZimError::Integration("registry unavailable".to_string()));
        }
        self.registered.lock().unwrap().push(manifest.clone());
        Ok(())
    }

    fn unregister_uninstall_entry(&self, identity: &str) -> Result<()> {
        if self.fail_everything {
            return Err(ZimError::Integration("registry unavailable".to_string()));
        }
        self.unregistered.lock().unwrap().push(identity.to_string());
        Ok(())
    }

    fn query_installed_version(&self, _identity: &str) -> InstalledVersion {
        self.installed
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(InstalledVersion::not_installed)
    }
}

#[derive(Default)]
pub struct RecordingDeleter {
    pub fail: bool,
    pub scheduled: Mutex<Vec<(PathBuf, Option<PathBuf>)>>,
}

impl DeferredDeleter for RecordingDeleter {
    fn schedule_deletion(&self, executable: &Path, directory: Option<&Path>) -> Result<()> {
        if self.fail {
            return Err(ZimError::Generic("cannot spawn".to_string()));
        }
        self.scheduled
            .lock()
            .unwrap()
            .push((executable.to_path_buf(), directory.map(Path::to_path_buf)));
        Ok(())
    }
}
