// zim-core/src/self_install.rs
//! Installing, updating and removing the tool's own binary.
//!
//! The tool lives in a fixed directory under the programs root and registers
//! itself like any other application. The running binary must never be the
//! file being replaced, so installing from the installed copy is refused.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use zim_common::config::{
    Config, MANIFEST_FILENAME, SELF_EXECUTABLE_FILENAME, TOOL_NAME, UNINSTALLER_FILENAME,
};
use zim_common::error::{Result, ZimError};
use zim_common::model::version::compare_checked;
use zim_common::model::{InstalledVersion, ManifestSkeleton, VersionComparison};

use crate::install::engine::same_file;
use crate::install::{write_manifest, InstallOutcome, InstallationEngine};
use crate::integration::{DeferredDeleter, SystemIntegration};
use crate::progress::ProgressReporter;
use crate::uninstall::{UninstallReport, UninstallSession, UninstallationEngine};
use crate::version_store::VersionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfInstallOffer {
    Install,
    Update { from: String, to: String },
    Uninstall,
}

impl fmt::Display for SelfInstallOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelfInstallOffer::Install => write!(f, "Install {TOOL_NAME} in the system"),
            SelfInstallOffer::Update { from, to } => {
                write!(f, "Update {TOOL_NAME} (v{from} -> v{to})")
            }
            SelfInstallOffer::Uninstall => write!(f, "Uninstall {TOOL_NAME}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelfInstallStatus {
    pub running_version: String,
    pub running_from_install: bool,
    pub installed: InstalledVersion,
    pub offers: Vec<SelfInstallOffer>,
}

pub struct SelfInstallCoordinator<'a> {
    config: &'a Config,
    integration: &'a dyn SystemIntegration,
    deleter: &'a dyn DeferredDeleter,
    versions: &'a dyn VersionStore,
    running_executable: PathBuf,
}

impl<'a> SelfInstallCoordinator<'a> {
    pub fn new(
        config: &'a Config,
        integration: &'a dyn SystemIntegration,
        deleter: &'a dyn DeferredDeleter,
        versions: &'a dyn VersionStore,
    ) -> Result<Self> {
        let running_executable = std::env::current_exe()
            .map_err(|e| ZimError::io_at(e, "locate", Path::new("the running executable")))?;
        Ok(Self {
            config,
            integration,
            deleter,
            versions,
            running_executable,
        })
    }

    pub fn with_running_executable(mut self, path: PathBuf) -> Self {
        self.running_executable = path;
        self
    }

    pub fn install_dir(&self) -> PathBuf {
        self.config.self_install_dir()
    }

    pub fn installed_executable(&self) -> PathBuf {
        self.install_dir().join(SELF_EXECUTABLE_FILENAME)
    }

    pub fn running_from_install(&self) -> bool {
        let dir = self.install_dir();
        match (self.running_executable.canonicalize(), dir.canonicalize()) {
            (Ok(exe), Ok(dir)) => exe.starts_with(dir),
            _ => self.running_executable.starts_with(&dir),
        }
    }

    pub fn status(&self) -> Result<SelfInstallStatus> {
        let running_version = self.versions.read()?;
        let installed = self.integration.query_installed_version(TOOL_NAME);
        let offers = offers_for(&running_version, &installed);
        debug!(
            "Self status: running {} installed {:?} offers {:?}",
            running_version, installed.version, offers
        );
        Ok(SelfInstallStatus {
            running_version,
            running_from_install: self.running_from_install(),
            installed,
            offers,
        })
    }

    /// Copies the running binary into the fixed location and registers it.
    /// Also used for updates, which overwrite the previous copy.
    #[instrument(skip_all)]
    pub fn install_self(&self, reporter: &ProgressReporter) -> Result<InstallOutcome> {
        let install_dir = self.install_dir();
        let dest_exe = self.installed_executable();
        if same_file(&self.running_executable, &dest_exe)
            || same_file(&self.running_executable, &install_dir.join(UNINSTALLER_FILENAME))
        {
            return Err(ZimError::InstallError(format!(
                "{} is running from its install location {}; run a different copy to install or update",
                TOOL_NAME,
                install_dir.display()
            )));
        }

        let engine = InstallationEngine::new(self.integration)
            .with_running_executable(Some(self.running_executable.clone()));
        let version = self.versions.read()?;

        reporter.status(format!("Installing {TOOL_NAME} {version}..."));
        reporter.progress(10);
        zim_aio::fs::create_dir_all(&install_dir)?;
        let exe_size = zim_aio::fs::copy_file(&self.running_executable, &dest_exe)?;
        #[cfg(unix)]
        zim_aio::fs::set_permissions(&dest_exe, 0o755)?;
        reporter.progress(40);

        reporter.status("Creating uninstaller...");
        engine.place_uninstaller(&install_dir)?;
        reporter.progress(60);

        reporter.status("Compiling installation info...");
        let mut skeleton = ManifestSkeleton::new(TOOL_NAME, SELF_EXECUTABLE_FILENAME);
        skeleton.version = version;
        skeleton.icon_path = format!("\"{}\",0", dest_exe.display());
        let manifest = skeleton.into_manifest(
            &install_dir,
            vec![
                SELF_EXECUTABLE_FILENAME.to_string(),
                UNINSTALLER_FILENAME.to_string(),
                MANIFEST_FILENAME.to_string(),
            ],
            exe_size * 2,
        );
        write_manifest(&install_dir, &manifest)?;
        reporter.progress(70);

        let warnings = engine.integrate(&manifest, false, true, reporter);
        reporter.progress(100);
        reporter.status(format!("{TOOL_NAME} installed successfully"));
        info!("Installed {} {} into {}", TOOL_NAME, manifest.version, install_dir.display());
        Ok(InstallOutcome { manifest, warnings })
    }

    /// Removes the installed copy with everything in its directory. When this
    /// process runs from there, the rest is deleted after it exits.
    #[instrument(skip_all)]
    pub fn uninstall_self(&self, reporter: &ProgressReporter) -> Result<UninstallReport> {
        let install_dir = self.install_dir();
        let engine = UninstallationEngine::new(self.integration, self.deleter)
            .with_running_executable(Some(self.running_executable.clone()));

        let report = match UninstallSession::open(&install_dir) {
            Ok(session) => engine.uninstall(&session, true, reporter)?,
            Err(ZimError::ManifestNotFound(_)) => {
                warn!(
                    "No installation found in {}, removing the registration only",
                    install_dir.display()
                );
                let warnings = engine.remove_integrations(TOOL_NAME, reporter);
                reporter.progress(100);
                UninstallReport {
                    name: TOOL_NAME.to_string(),
                    warnings,
                    ..UninstallReport::default()
                }
            }
            Err(e) => return Err(e),
        };
        debug!("Self uninstall report: {:?}", report);
        reporter.status(format!("{TOOL_NAME} uninstalled successfully"));
        Ok(report)
    }
}

/// Actions available given the running and the registered version.
pub fn offers_for(running_version: &str, installed: &InstalledVersion) -> Vec<SelfInstallOffer> {
    if !installed.installed {
        return vec![SelfInstallOffer::Install];
    }
    let installed_version = installed.version.clone().unwrap_or_default();
    match compare_checked(running_version, &installed_version) {
        VersionComparison::Greater => vec![
            SelfInstallOffer::Update {
                from: installed_version,
                to: running_version.to_string(),
            },
            SelfInstallOffer::Uninstall,
        ],
        VersionComparison::Unknown => {
            warn!(
                "Cannot compare running version '{}' with installed version '{}'",
                running_version, installed_version
            );
            vec![SelfInstallOffer::Uninstall]
        }
        VersionComparison::Lesser | VersionComparison::Equal => vec![SelfInstallOffer::Uninstall],
    }
}
