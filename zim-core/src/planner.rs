// zim-core/src/planner.rs
//! Turns an inspected archive into install defaults: display name, version,
//! publisher, executable, icon and target directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zim_common::config::{Config, DEFAULT_MANIFEST_VERSION, TOOL_NAME};
use zim_common::error::Result;
use zim_common::model::{ArchiveInspectionResult, ManifestSkeleton};

use crate::install::extract::extract_single;
use crate::install::InstallRequest;
use crate::metadata::ExecutableMetadata;

/// Version shown when the executable carries none.
pub const FALLBACK_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub archive_path: PathBuf,
    pub extraction_root: Option<String>,
    pub name: String,
    /// Empty when the archive has no recognisable executable.
    pub executable: String,
    pub version: String,
    pub publisher: String,
    pub install_path: PathBuf,
    /// Whether the name and version came from the executable itself.
    pub from_metadata: bool,
}

impl InstallPlan {
    pub fn is_ready(&self) -> bool {
        !self.archive_path.as_os_str().is_empty()
            && !self.name.trim().is_empty()
            && !self.executable.trim().is_empty()
    }

    /// Renames the application; the install path follows the new name.
    pub fn rename(&mut self, name: &str, config: &Config) {
        self.name = name.to_string();
        self.install_path = config.app_install_dir(name);
    }

    pub fn icon_path(&self) -> String {
        format!("{},0", self.install_path.join(&self.executable).display())
    }

    pub fn into_request(self, create_desktop_shortcut: bool, create_start_menu_shortcut: bool) -> InstallRequest {
        let icon_path = self.icon_path();
        let mut skeleton = ManifestSkeleton::new(self.name, self.executable);
        skeleton.version = if self.version.trim().is_empty() {
            DEFAULT_MANIFEST_VERSION.to_string()
        } else {
            self.version
        };
        skeleton.installed_by = self.publisher;
        skeleton.icon_path = icon_path;
        InstallRequest {
            archive_path: self.archive_path,
            install_dir: self.install_path,
            extraction_root: self.extraction_root,
            skeleton,
            create_desktop_shortcut,
            create_start_menu_shortcut,
        }
    }
}

/// Builds install defaults for `archive_path`.
///
/// The first executable candidate is extracted into a scratch directory so
/// `metadata` can read it. Metadata problems fall back to the file stem.
pub fn plan_install(
    archive_path: &Path,
    inspection: &ArchiveInspectionResult,
    metadata: &dyn ExecutableMetadata,
    config: &Config,
) -> Result<InstallPlan> {
    let Some(candidate) = inspection.primary_executable() else {
        let name = file_stem(archive_path);
        debug!("No executable in {}, planning with name {}", archive_path.display(), name);
        return Ok(InstallPlan {
            archive_path: archive_path.to_path_buf(),
            extraction_root: None,
            install_path: config.app_install_dir(&name),
            name,
            executable: String::new(),
            version: FALLBACK_VERSION.to_string(),
            publisher: TOOL_NAME.to_string(),
            from_metadata: false,
        });
    };

    let stem = file_stem(Path::new(candidate));
    let (name, version, publisher, from_metadata) =
        match read_candidate_metadata(archive_path, inspection, candidate, metadata) {
            Ok(values) if !values.is_empty() => {
                let name = first_of(&values, &["ProductName", "InternalName"])
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| stem.clone());
                let version = first_of(&values, &["FileVersion", "FileVersionRaw", "ProductVersion"])
                    .map(clean_version)
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| FALLBACK_VERSION.to_string());
                let publisher = first_of(&values, &["LegalCopyright"])
                    .map(str::to_string)
                    .unwrap_or_else(|| TOOL_NAME.to_string());
                (name, version, publisher, true)
            }
            Ok(_) => (stem.clone(), FALLBACK_VERSION.to_string(), TOOL_NAME.to_string(), false),
            Err(e) => {
                warn!("Error reading metadata of {}: {}", candidate, e);
                (stem.clone(), FALLBACK_VERSION.to_string(), TOOL_NAME.to_string(), false)
            }
        };

    Ok(InstallPlan {
        archive_path: archive_path.to_path_buf(),
        extraction_root: inspection.extraction_root.clone(),
        install_path: config.app_install_dir(&name),
        name,
        executable: candidate.to_string(),
        version,
        publisher,
        from_metadata,
    })
}

fn read_candidate_metadata(
    archive_path: &Path,
    inspection: &ArchiveInspectionResult,
    candidate: &str,
    metadata: &dyn ExecutableMetadata,
) -> Result<HashMap<String, String>> {
    let scratch = tempfile::tempdir()?;
    let extracted = scratch.path().join(candidate);
    extract_single(archive_path, &inspection.entry_name(candidate), &extracted)?;
    metadata.lookup(&extracted)
}

fn first_of<'m>(values: &'m HashMap<String, String>, keys: &[&str]) -> Option<&'m str> {
    keys.iter().find_map(|k| values.get(*k).map(String::as_str))
}

/// `"1, 2, 0, 4"` becomes `"1.2.0.4"`.
fn clean_version(raw: &str) -> String {
    raw.trim().replace(',', ".").replace(' ', "")
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::inspect_archive;
    use crate::metadata::NoMetadata;
    use crate::test_util::write_zip;
    use zim_common::error::ZimError;

    struct FixedMetadata(Vec<(&'static str, &'static str)>);

    impl ExecutableMetadata for FixedMetadata {
        fn lookup(&self, executable: &Path) -> Result<HashMap<String, String>> {
            assert!(executable.is_file());
            Ok(self
                .0
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect())
        }
    }

    struct BrokenMetadata;

    impl ExecutableMetadata for BrokenMetadata {
        fn lookup(&self, _executable: &Path) -> Result<HashMap<String, String>> {
            Err(ZimError::Generic("no version resource".to_string()))
        }
    }

    #[test]
    fn metadata_drives_name_version_and_publisher() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::with_root(tmp.path());
        let zip = write_zip(tmp.path(), "bundle.zip", &[("Tool/tool.exe", "MZ")]);
        let inspection = inspect_archive(&zip).unwrap();
        let metadata = FixedMetadata(vec![
            ("InternalName", "tool-internal"),
            ("ProductName", "  Super Tool "),
            ("FileVersionRaw", "9.9.9.9"),
            ("FileVersion", "2, 1, 0, 7"),
            ("LegalCopyright", "Acme Corp"),
        ]);

        let plan = plan_install(&zip, &inspection, &metadata, &config).unwrap();
        assert_eq!(plan.name, "Super Tool");
        assert_eq!(plan.version, "2.1.0.7");
        assert_eq!(plan.publisher, "Acme Corp");
        assert_eq!(plan.executable, "tool.exe");
        assert_eq!(plan.extraction_root.as_deref(), Some("Tool"));
        assert_eq!(plan.install_path, config.programs_dir().join("Super Tool"));
        assert!(plan.from_metadata);
        assert!(plan.is_ready());

        let request = plan.into_request(true, false);
        assert_eq!(request.skeleton.installed_by, "Acme Corp");
        assert!(request.skeleton.icon_path.ends_with("tool.exe,0"));
        assert_eq!(request.extraction_root.as_deref(), Some("Tool"));
    }

    #[test]
    fn missing_metadata_falls_back_to_stem() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::with_root(tmp.path());
        let zip = write_zip(tmp.path(), "bundle.zip", &[("viewer.exe", "MZ")]);
        let inspection = inspect_archive(&zip).unwrap();

        for provider in [&NoMetadata as &dyn ExecutableMetadata, &BrokenMetadata] {
            let plan = plan_install(&zip, &inspection, provider, &config).unwrap();
            assert_eq!(plan.name, "viewer");
            assert_eq!(plan.version, FALLBACK_VERSION);
            assert_eq!(plan.publisher, TOOL_NAME);
            assert!(!plan.from_metadata);
        }
    }

    #[test]
    fn archive_without_executable_is_not_ready() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::with_root(tmp.path());
        let zip = write_zip(tmp.path(), "docs-pack.zip", &[("docs/readme.txt", "hi")]);
        let inspection = inspect_archive(&zip).unwrap();

        let mut plan = plan_install(&zip, &inspection, &NoMetadata, &config).unwrap();
        assert_eq!(plan.name, "docs-pack");
        assert!(!plan.is_ready());
        plan.executable = "run.exe".to_string();
        plan.rename("Docs", &config);
        assert!(plan.is_ready());
        assert_eq!(plan.install_path, config.programs_dir().join("Docs"));
    }
}
