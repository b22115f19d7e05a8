// zim-core/src/install/engine.rs
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use zim_common::config::UNINSTALLER_FILENAME;
use zim_common::error::{Result, ZimError};
use zim_common::model::InstallManifest;

use super::extract::{extract_members, EXTRACT_START};
use super::manifest::write_manifest;
use super::{InstallOutcome, InstallRequest};
use crate::integration::SystemIntegration;
use crate::progress::ProgressReporter;

/// Places archives on disk and hands the result to the host integration.
pub struct InstallationEngine<'a> {
    integration: &'a dyn SystemIntegration,
    running_executable: Option<PathBuf>,
}

impl<'a> InstallationEngine<'a> {
    pub fn new(integration: &'a dyn SystemIntegration) -> Self {
        Self {
            integration,
            running_executable: std::env::current_exe().ok(),
        }
    }

    /// Overrides the binary copied in as the uninstaller.
    pub fn with_running_executable(mut self, path: Option<PathBuf>) -> Self {
        self.running_executable = path;
        self
    }

    #[instrument(skip_all, fields(name = %request.skeleton.name, dir = %request.install_dir.display()))]
    pub fn install(&self, request: &InstallRequest, reporter: &ProgressReporter) -> Result<InstallOutcome> {
        let install_dir = request.install_dir.as_path();
        let mut warnings = Vec::new();

        zim_aio::fs::create_dir_all(install_dir)?;
        reporter.status("Extracting files...");
        reporter.progress(EXTRACT_START);

        let mut installed_files = extract_members(
            &request.archive_path,
            install_dir,
            request.extraction_root.as_deref(),
            reporter,
        )?;
        debug!("Extracted {} files", installed_files.len());

        reporter.status("Creating uninstaller...");
        reporter.progress(60);
        match self.place_uninstaller(install_dir) {
            Ok(()) => {
                if !installed_files.iter().any(|f| f == UNINSTALLER_FILENAME) {
                    installed_files.push(UNINSTALLER_FILENAME.to_string());
                }
            }
            Err(e) => warnings.push(reporter.warn(format!("Failed to create uninstaller: {e}"))),
        }

        reporter.status("Compiling installation info...");
        reporter.progress(65);
        let installed_size = zim_aio::fs::directory_size(install_dir);

        let executable = request.skeleton.executable.trim();
        if executable.is_empty() || !install_dir.join(executable).is_file() {
            return Err(ZimError::InstallError(format!(
                "The executable {executable} does not exist in the archive"
            )));
        }

        let manifest = request
            .skeleton
            .clone()
            .into_manifest(install_dir, installed_files, installed_size);
        write_manifest(install_dir, &manifest)?;
        reporter.progress(70);

        warnings.extend(self.integrate(
            &manifest,
            request.create_desktop_shortcut,
            request.create_start_menu_shortcut,
            reporter,
        ));

        reporter.progress(100);
        reporter.status("Installation complete!");
        info!(
            "Installed {} into {} ({} files)",
            manifest.name,
            install_dir.display(),
            manifest.installed_files.len()
        );
        Ok(InstallOutcome { manifest, warnings })
    }

    /// Creates the requested shortcuts and registers the uninstall entry.
    /// Failures come back as warnings.
    pub(crate) fn integrate(
        &self,
        manifest: &InstallManifest,
        desktop: bool,
        start_menu: bool,
        reporter: &ProgressReporter,
    ) -> Vec<String> {
        let mut warnings = Vec::new();
        let target = manifest.executable_path();
        let links = [
            (desktop, "desktop", self.integration.desktop_shortcut_path(&manifest.name), 85),
            (start_menu, "start menu", self.integration.start_menu_shortcut_path(&manifest.name), 90),
        ];
        for (wanted, kind, link, progress) in links {
            if !wanted {
                continue;
            }
            if !self
                .integration
                .create_shortcut(&target, &link, &manifest.install_path, &manifest.icon_path)
            {
                warnings.push(reporter.warn(format!(
                    "Failed to create {kind} shortcut {}",
                    link.display()
                )));
            }
            reporter.progress(progress);
        }

        reporter.status("Registering in system...");
        if let Err(e) = self.integration.register_uninstall_entry(manifest) {
            warnings.push(reporter.warn(format!("Failed to register uninstall entry: {e}")));
        }
        warnings
    }

    /// Copies the running binary into `install_dir` as its uninstaller.
    pub(crate) fn place_uninstaller(&self, install_dir: &Path) -> Result<()> {
        let source = self.running_executable.as_deref().ok_or_else(|| {
            ZimError::NotFound("path of the running executable".to_string())
        })?;
        let destination = install_dir.join(UNINSTALLER_FILENAME);
        if same_file(source, &destination) {
            debug!("Uninstaller already in place at {}", destination.display());
            return Ok(());
        }
        zim_aio::fs::copy_file(source, &destination)?;
        #[cfg(unix)]
        zim_aio::fs::set_permissions(&destination, 0o755)?;
        Ok(())
    }
}

pub(crate) fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use zim_common::config::MANIFEST_FILENAME;
    use zim_common::model::ManifestSkeleton;

    use super::*;
    use crate::install::read_manifest;
    use crate::test_util::{drain, fake_running_exe, progress_values, write_zip, RecordingIntegration};

    fn request(archive: &Path, dir: &Path, root: Option<&str>, exe: &str) -> InstallRequest {
        InstallRequest {
            archive_path: archive.to_path_buf(),
            install_dir: dir.to_path_buf(),
            extraction_root: root.map(str::to_string),
            skeleton: ManifestSkeleton::new("App", exe),
            create_desktop_shortcut: true,
            create_start_menu_shortcut: true,
        }
    }

    #[test]
    fn installs_flat_archive_and_records_files_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let zip = write_zip(
            tmp.path(),
            "app.zip",
            &[("app.exe", "MZ"), ("data/readme.txt", "hello")],
        );
        let integration = RecordingIntegration::new(tmp.path());
        let engine = InstallationEngine::new(&integration)
            .with_running_executable(Some(fake_running_exe(tmp.path())));
        let dir = tmp.path().join("Programs/App");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let outcome = engine
            .install(&request(&zip, &dir, None, "app.exe"), &ProgressReporter::new("App", tx))
            .unwrap();

        assert!(outcome.warnings.is_empty());
        assert_eq!(
            outcome.manifest.installed_files,
            vec!["app.exe", "data/readme.txt", UNINSTALLER_FILENAME]
        );
        assert!(dir.join(UNINSTALLER_FILENAME).is_file());
        assert_eq!(read_manifest(&dir).unwrap(), outcome.manifest);
        assert!(outcome.manifest.installed_size > 0);
        assert_eq!(integration.registered.lock().unwrap().len(), 1);
        assert_eq!(integration.shortcuts_created.lock().unwrap().len(), 2);

        let progress = progress_values(&drain(&mut rx));
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(progress.last(), Some(&100));
        assert!(progress.contains(&60) && progress.contains(&70));
    }

    #[test]
    fn extraction_root_lands_at_install_root() {
        let tmp = tempfile::tempdir().unwrap();
        let zip = write_zip(
            tmp.path(),
            "app.zip",
            &[("MyApp/app.exe", "MZ"), ("MyApp/lib.dll", "lib")],
        );
        let integration = RecordingIntegration::new(tmp.path());
        let engine = InstallationEngine::new(&integration)
            .with_running_executable(Some(fake_running_exe(tmp.path())));
        let dir = tmp.path().join("target");

        let outcome = engine
            .install(
                &request(&zip, &dir, Some("MyApp"), "app.exe"),
                &ProgressReporter::silent("App"),
            )
            .unwrap();
        assert_eq!(
            outcome.manifest.installed_files,
            vec!["app.exe", "lib.dll", UNINSTALLER_FILENAME]
        );
        assert!(dir.join("lib.dll").is_file());
    }

    #[test]
    fn missing_executable_fails_without_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let zip = write_zip(tmp.path(), "app.zip", &[("readme.txt", "hi")]);
        let integration = RecordingIntegration::new(tmp.path());
        let engine = InstallationEngine::new(&integration)
            .with_running_executable(Some(fake_running_exe(tmp.path())));
        let dir = tmp.path().join("target");

        let err = engine
            .install(&request(&zip, &dir, None, "app.exe"), &ProgressReporter::silent("App"))
            .unwrap_err();
        assert!(matches!(err, ZimError::InstallError(ref m) if m.contains("app.exe")));
        assert!(!dir.join(MANIFEST_FILENAME).exists());
        assert!(integration.registered.lock().unwrap().is_empty());
    }

    #[test]
    fn integration_failures_are_warnings() {
        let tmp = tempfile::tempdir().unwrap();
        let zip = write_zip(tmp.path(), "app.zip", &[("app.exe", "MZ")]);
        let integration = RecordingIntegration::failing(tmp.path());
        let engine = InstallationEngine::new(&integration).with_running_executable(None);
        let dir = tmp.path().join("target");

        let outcome = engine
            .install(&request(&zip, &dir, None, "app.exe"), &ProgressReporter::silent("App"))
            .unwrap();
        // uninstaller, desktop, start menu, registry
        assert_eq!(outcome.warnings.len(), 4);
        assert_eq!(outcome.manifest.installed_files, vec!["app.exe"]);
        assert!(dir.join(MANIFEST_FILENAME).is_file());
    }

    #[test]
    fn reinstalling_into_existing_dir_succeeds_identically() {
        let tmp = tempfile::tempdir().unwrap();
        let zip = write_zip(tmp.path(), "app.zip", &[("app.exe", "MZ"), ("lib/core.dll", "lib")]);
        let integration = RecordingIntegration::new(tmp.path());
        let engine = InstallationEngine::new(&integration)
            .with_running_executable(Some(fake_running_exe(tmp.path())));
        let dir = tmp.path().join("target");
        fs::create_dir_all(&dir).unwrap();
        let req = request(&zip, &dir, None, "app.exe");

        let first = engine.install(&req, &ProgressReporter::silent("App")).unwrap();
        let second = engine.install(&req, &ProgressReporter::silent("App")).unwrap();
        assert_eq!(
            first.manifest.installed_files,
            vec!["app.exe", "lib/core.dll", UNINSTALLER_FILENAME]
        );
        assert_eq!(second.manifest.installed_files, first.manifest.installed_files);
        assert!(second.warnings.is_empty());
        assert_eq!(read_manifest(&dir).unwrap(), second.manifest);
    }
}
