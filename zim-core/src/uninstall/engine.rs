// zim-core/src/uninstall/engine.rs
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use zim_common::config::{MANIFEST_FILENAME, UNINSTALLER_FILENAME};
use zim_common::error::Result;
use zim_common::model::manifest::relative_manifest_path;
use zim_common::model::InstallManifest;

use super::common::{prune_empty_dirs, remove_file_artifact, Removal};
use super::UninstallReport;
use crate::install::engine::same_file;
use crate::install::extract::safe_join;
use crate::install::manifest::{manifest_path, read_manifest};
use crate::integration::{DeferredDeleter, SystemIntegration};
use crate::progress::ProgressReporter;

/// A loaded install directory, ready to be removed.
#[derive(Debug, Clone)]
pub struct UninstallSession {
    install_dir: PathBuf,
    manifest: InstallManifest,
    additional_files: Vec<String>,
    unreadable: Vec<PathBuf>,
}

impl UninstallSession {
    /// Loads the manifest of `install_dir` and classifies what is on disk.
    /// Fails when there is no manifest; nothing is touched in that case.
    pub fn open(install_dir: &Path) -> Result<Self> {
        let manifest = read_manifest(install_dir)?;
        let listing = zim_aio::fs::regular_files_under(install_dir);
        let additional_files = classify_additional(install_dir, &manifest, &listing.files);
        debug!(
            "Opened {} with {} original and {} additional files ({} unreadable entries)",
            install_dir.display(),
            manifest.installed_files.len(),
            additional_files.len(),
            listing.unreadable.len()
        );
        Ok(Self {
            install_dir: install_dir.to_path_buf(),
            manifest,
            additional_files,
            unreadable: listing.unreadable,
        })
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn manifest(&self) -> &InstallManifest {
        &self.manifest
    }

    pub fn additional_files(&self) -> &[String] {
        &self.additional_files
    }

    /// Entries below the install directory that could not be read.
    pub fn unreadable(&self) -> &[PathBuf] {
        &self.unreadable
    }

    pub fn has_additional_files(&self) -> bool {
        !self.additional_files.is_empty()
    }

    /// The first `limit` additional files, for display.
    pub fn additional_sample(&self, limit: usize) -> &[String] {
        &self.additional_files[..self.additional_files.len().min(limit)]
    }
}

/// Regular files under `install_dir` that the installer did not write, as
/// `/`-separated relative paths. The manifest and the uninstaller are excluded.
/// Directories that cannot be read are skipped.
pub fn find_additional_files(install_dir: &Path, manifest: &InstallManifest) -> Vec<String> {
    let listing = zim_aio::fs::regular_files_under(install_dir);
    classify_additional(install_dir, manifest, &listing.files)
}

fn classify_additional(install_dir: &Path, manifest: &InstallManifest, files: &[PathBuf]) -> Vec<String> {
    let original: HashSet<String> = manifest.original_files();
    let mut additional = Vec::new();
    for path in files {
        let Some(relative) = relative_manifest_path(install_dir, path) else {
            continue;
        };
        if relative == MANIFEST_FILENAME
            || relative == UNINSTALLER_FILENAME
            || original.contains(&relative)
        {
            continue;
        }
        additional.push(relative);
    }
    additional.sort();
    additional
}

pub struct UninstallationEngine<'a> {
    integration: &'a dyn SystemIntegration,
    deleter: &'a dyn DeferredDeleter,
    running_executable: Option<PathBuf>,
}

impl<'a> UninstallationEngine<'a> {
    pub fn new(integration: &'a dyn SystemIntegration, deleter: &'a dyn DeferredDeleter) -> Self {
        Self {
            integration,
            deleter,
            running_executable: std::env::current_exe().ok(),
        }
    }

    /// Overrides the binary that is treated as currently running.
    pub fn with_running_executable(mut self, path: Option<PathBuf>) -> Self {
        self.running_executable = path;
        self
    }

    /// Removes the installation described by `session`.
    ///
    /// With `delete_additional`, everything under the directory goes and the
    /// directory itself is removed; otherwise only the files the installer
    /// wrote (and the manifest) are deleted.
    #[instrument(skip_all, fields(name = %session.manifest.name, delete_additional = delete_additional))]
    pub fn uninstall(
        &self,
        session: &UninstallSession,
        delete_additional: bool,
        reporter: &ProgressReporter,
    ) -> Result<UninstallReport> {
        let install_dir = session.install_dir();
        let manifest = session.manifest();
        let mut report = UninstallReport {
            name: manifest.name.clone(),
            additional_files: session.additional_files().to_vec(),
            ..UninstallReport::default()
        };

        let running_inside = self
            .running_executable
            .as_deref()
            .filter(|exe| is_inside(exe, install_dir))
            .map(Path::to_path_buf);

        reporter.status("Removing files...");
        reporter.progress(10);

        let targets = if delete_additional {
            let listing = zim_aio::fs::regular_files_under(install_dir);
            for path in listing.unreadable {
                report
                    .warnings
                    .push(reporter.warn(format!("Could not read {}", path.display())));
                report.files_remaining.push(path);
            }
            listing.files
        } else {
            self.original_targets(session, &mut report, reporter)
        };

        let total = targets.len().max(1);
        for (i, path) in targets.iter().enumerate() {
            reporter.progress(10 + (i * 70 / total) as u8);
            if running_inside
                .as_deref()
                .is_some_and(|exe| same_file(exe, path))
            {
                debug!("Keeping running executable {}", path.display());
                continue;
            }
            match remove_file_artifact(path) {
                Removal::Removed => report.files_deleted += 1,
                Removal::Absent => {}
                Removal::Failed(e) => {
                    reporter.file_removal_failed(path, &e);
                    report.files_remaining.push(path.clone());
                }
            }
        }

        if !delete_additional {
            let manifest_file = manifest_path(install_dir);
            match remove_file_artifact(&manifest_file) {
                Removal::Removed | Removal::Absent => {}
                Removal::Failed(e) => {
                    reporter.file_removal_failed(&manifest_file, &e);
                    report.files_remaining.push(manifest_file);
                }
            }
        }

        let pruned = prune_empty_dirs(install_dir);
        debug!("Removed {} empty directories", pruned);
        reporter.progress(80);

        self.finish_directory(install_dir, running_inside.as_deref(), delete_additional, &mut report, reporter);

        let warnings = self.remove_integrations(&manifest.name, reporter);
        report.warnings.extend(warnings);

        reporter.progress(100);
        reporter.status("Uninstallation complete!");
        info!(
            "Uninstalled {}: {} deleted, {} remaining",
            report.name,
            report.files_deleted,
            report.files_remaining.len()
        );
        Ok(report)
    }

    /// Removes both shortcuts and the uninstall entry of `name`. Failures
    /// come back as warnings.
    pub(crate) fn remove_integrations(&self, name: &str, reporter: &ProgressReporter) -> Vec<String> {
        let mut warnings = Vec::new();
        reporter.status("Removing shortcuts...");
        for link in [
            self.integration.desktop_shortcut_path(name),
            self.integration.start_menu_shortcut_path(name),
        ] {
            if !self.integration.remove_shortcut(&link) {
                warnings.push(reporter.warn(format!("Failed to remove shortcut {}", link.display())));
            }
        }
        reporter.progress(90);

        reporter.status("Unregistering from system...");
        if let Err(e) = self.integration.unregister_uninstall_entry(name) {
            warnings.push(reporter.warn(format!("Failed to remove uninstall entry: {e}")));
        }
        warnings
    }

    fn original_targets(
        &self,
        session: &UninstallSession,
        report: &mut UninstallReport,
        reporter: &ProgressReporter,
    ) -> Vec<PathBuf> {
        let mut targets = Vec::new();
        for relative in &session.manifest().installed_files {
            match safe_join(session.install_dir(), relative) {
                // Unreadable originals stay in the list so the failure is reported.
                Ok(path) => match path.symlink_metadata() {
                    Ok(metadata) if metadata.is_dir() => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    _ => targets.push(path),
                },
                Err(e) => report
                    .warnings
                    .push(reporter.warn(format!("Skipping manifest entry {relative}: {e}"))),
            }
        }
        targets
    }

    /// Hands the running uninstaller (and, when everything goes, the directory)
    /// to the deferred deleter, or removes the emptied directory directly.
    fn finish_directory(
        &self,
        install_dir: &Path,
        running_inside: Option<&Path>,
        delete_additional: bool,
        report: &mut UninstallReport,
        reporter: &ProgressReporter,
    ) {
        if let Some(exe) = running_inside {
            let directory = delete_additional.then_some(install_dir);
            match self.deleter.schedule_deletion(exe, directory) {
                Ok(()) => report.deferred_scheduled = true,
                Err(e) => {
                    report.warnings.push(reporter.warn(format!(
                        "Failed to schedule removal of {}: {e}",
                        exe.display()
                    )));
                    report.files_remaining.push(exe.to_path_buf());
                }
            }
            return;
        }
        if delete_additional {
            if let Err(e) = zim_aio::fs::remove_dir(install_dir) {
                warn!("Install directory {} not removed: {}", install_dir.display(), e);
                report.files_remaining.push(install_dir.to_path_buf());
            }
        }
    }
}

fn is_inside(path: &Path, dir: &Path) -> bool {
    match (path.canonicalize(), dir.canonicalize()) {
        (Ok(p), Ok(d)) => p.starts_with(d),
        _ => path.starts_with(dir),
    }
}
