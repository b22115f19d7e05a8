// zim-core/src/inspect.rs
//! Locates the launchable program inside an arbitrary ZIP layout.
//!
//! Two layouts are recognised: executables directly at the archive root, or
//! executables one level below a single leading directory (the common
//! "`MyApp-1.2/MyApp.exe`" packaging). Anything deeper is not searched.

use std::fs::File;
use std::path::Path;

use tracing::debug;
use zim_common::config::EXECUTABLE_SUFFIX;
use zim_common::error::{Result, ZimError};
use zim_common::model::ArchiveInspectionResult;
use zip::ZipArchive;

/// Scans the archive at `archive_path` for executable candidates.
pub fn inspect_archive(archive_path: &Path) -> Result<ArchiveInspectionResult> {
    debug!("Inspecting archive {}", archive_path.display());
    let names = read_entry_names(archive_path)?;
    let result = inspect_entries(&names);
    debug!(
        "Inspection of {} found {} candidate(s), root {:?}",
        archive_path.display(),
        result.executable_candidates.len(),
        result.extraction_root
    );
    Ok(result)
}

/// Applies the detection heuristic to an entry list.
pub fn inspect_entries<S: AsRef<str>>(names: &[S]) -> ArchiveInspectionResult {
    let normalized: Vec<String> = names
        .iter()
        .map(|n| normalize_entry_name(n.as_ref()))
        .collect();

    let root_candidates: Vec<String> = normalized
        .iter()
        .filter(|n| !n.contains('/') && is_executable_name(n))
        .cloned()
        .collect();
    if !root_candidates.is_empty() {
        return ArchiveInspectionResult {
            executable_candidates: root_candidates,
            extraction_root: None,
        };
    }

    let Some(root) = normalized
        .iter()
        .find(|n| n.contains('/'))
        .and_then(|n| n.split('/').next())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
    else {
        return ArchiveInspectionResult::empty();
    };

    let nested: Vec<String> = normalized
        .iter()
        .filter_map(|n| {
            let segments: Vec<&str> = n.split('/').collect();
            match segments.as_slice() {
                [first, file] if *first == root && is_executable_name(file) => {
                    Some((*file).to_string())
                }
                _ => None,
            }
        })
        .collect();

    if nested.is_empty() {
        debug!("No executable at archive root or under '{}'", root);
        return ArchiveInspectionResult::empty();
    }

    ArchiveInspectionResult {
        executable_candidates: nested,
        extraction_root: Some(root),
    }
}

/// Archive entry names use either separator depending on the tool that wrote them.
pub(crate) fn normalize_entry_name(name: &str) -> String {
    name.replace('\\', "/")
}

fn is_executable_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(EXECUTABLE_SUFFIX)
}

fn read_entry_names(archive_path: &Path) -> Result<Vec<String>> {
    let file = File::open(archive_path).map_err(|e| {
        ZimError::Archive(format!(
            "Failed to open archive {}: {}",
            archive_path.display(),
            e
        ))
    })?;
    let archive = ZipArchive::new(file).map_err(|e| {
        ZimError::Archive(format!(
            "Failed to read ZIP {}: {}",
            archive_path.display(),
            e
        ))
    })?;
    Ok(archive.file_names().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::write_zip;

    #[test]
    fn executable_at_root_is_found() {
        let result = inspect_entries(&["app.exe", "data/readme.txt"]);
        assert_eq!(result.executable_candidates, vec!["app.exe"]);
        assert_eq!(result.extraction_root, None);
    }

    #[test]
    fn suffix_match_ignores_case() {
        let result = inspect_entries(&["Setup.EXE", "notes.txt"]);
        assert_eq!(result.executable_candidates, vec!["Setup.EXE"]);
    }

    #[test]
    fn executable_one_level_down_sets_root() {
        let result = inspect_entries(&["MyApp/", "MyApp/app.exe", "MyApp/lib.dll"]);
        assert_eq!(result.executable_candidates, vec!["app.exe"]);
        assert_eq!(result.extraction_root.as_deref(), Some("MyApp"));
    }

    #[test]
    fn backslash_separators_are_normalized() {
        let result = inspect_entries(&[r"Tool\tool.exe", r"Tool\res\icon.ico"]);
        assert_eq!(result.executable_candidates, vec!["tool.exe"]);
        assert_eq!(result.extraction_root.as_deref(), Some("Tool"));
    }

    #[test]
    fn deeper_executables_are_not_searched() {
        let result = inspect_entries(&["pkg/bin/app.exe", "pkg/readme.md"]);
        assert!(result.executable_candidates.is_empty());
        assert_eq!(result.extraction_root, None);
    }

    #[test]
    fn only_the_first_directory_is_considered_root() {
        let result = inspect_entries(&["docs/manual.pdf", "App/app.exe"]);
        assert!(!result.has_executable());
    }

    #[test]
    fn reads_a_real_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let zip_path = write_zip(
            tmp.path(),
            "app.zip",
            &[("MyApp/app.exe", "MZ"), ("MyApp/lib.dll", "lib")],
        );
        let result = inspect_archive(&zip_path).unwrap();
        assert_eq!(result.primary_executable(), Some("app.exe"));
        assert_eq!(result.entry_name("app.exe"), "MyApp/app.exe");
    }

    #[test]
    fn corrupt_archive_is_an_archive_error() {
        let tmp = tempfile::tempdir().unwrap();
        let bogus = tmp.path().join("bogus.zip");
        std::fs::write(&bogus, b"definitely not a zip").unwrap();
        assert!(matches!(
            inspect_archive(&bogus),
            Err(ZimError::Archive(_))
        ));
    }
}
