// zim-core/src/install/extract.rs
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use tracing::{debug, error};
use zim_common::error::{Result, ZimError};
use zip::read::ZipArchive;

use crate::inspect::normalize_entry_name;
use crate::progress::ProgressReporter;

/// Progress band covered by extraction.
pub(crate) const EXTRACT_START: u8 = 10;
const EXTRACT_SPAN: usize = 50;

/// One archive member selected for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Member {
    index: usize,
    /// `/`-separated path below the install directory.
    relative: String,
    is_dir: bool,
}

pub(crate) fn open_archive(archive_path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(archive_path)
        .map_err(|e| ZimError::io_at(e, "open archive", archive_path))?;
    ZipArchive::new(file).map_err(|e| {
        ZimError::Archive(format!(
            "Failed to open ZIP {}: {}",
            archive_path.display(),
            e
        ))
    })
}

/// Extracts the archive into `target_dir`, returning the relative paths of the
/// regular files written, in archive order.
///
/// With `extraction_root`, only members below that directory are extracted
/// and the leading segment is removed from their paths.
pub fn extract_members(
    archive_path: &Path,
    target_dir: &Path,
    extraction_root: Option<&str>,
    reporter: &ProgressReporter,
) -> Result<Vec<String>> {
    let mut archive = open_archive(archive_path)?;
    let members = select_members(&mut archive, extraction_root, archive_path)?;
    debug!(
        "Extracting {} of {} members from {} into {}",
        members.len(),
        archive.len(),
        archive_path.display(),
        target_dir.display()
    );

    let total = members.len();
    let step = (total / 20).max(1);
    let mut written = Vec::with_capacity(total);

    for (i, member) in members.iter().enumerate() {
        if i % step == 0 {
            reporter.progress(EXTRACT_START + (i * EXTRACT_SPAN / total) as u8);
        }
        let destination = safe_join(target_dir, &member.relative)?;
        if member.is_dir {
            zim_aio::fs::create_dir_all(&destination)?;
            continue;
        }
        if let Some(parent) = destination.parent() {
            zim_aio::fs::create_dir_all(parent)?;
        }
        let mut entry = archive.by_index(member.index).map_err(|e| {
            ZimError::Archive(format!(
                "Error reading ZIP index {} in {}: {}",
                member.index,
                archive_path.display(),
                e
            ))
        })?;
        zim_aio::fs::write_stream(&mut entry, &destination)?;
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            let mode = mode & 0o777;
            if mode != 0 {
                zim_aio::fs::set_permissions(&destination, mode)?;
            }
        }
        written.push(member.relative.clone());
    }

    Ok(written)
}

/// Extracts the single member `entry_name` to `destination`.
pub fn extract_single(archive_path: &Path, entry_name: &str, destination: &Path) -> Result<()> {
    let mut archive = open_archive(archive_path)?;
    let wanted = normalize_entry_name(entry_name);
    let index = (0..archive.len())
        .find(|&i| {
            archive
                .by_index_raw(i)
                .map(|f| normalize_entry_name(f.name()) == wanted)
                .unwrap_or(false)
        })
        .ok_or_else(|| {
            ZimError::NotFound(format!(
                "{} in {}",
                entry_name,
                archive_path.display()
            ))
        })?;
    let mut entry = archive.by_index(index)?;
    if let Some(parent) = destination.parent() {
        zim_aio::fs::create_dir_all(parent)?;
    }
    zim_aio::fs::write_stream(&mut entry, destination)?;
    Ok(())
}

fn select_members<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    extraction_root: Option<&str>,
    archive_path: &Path,
) -> Result<Vec<Member>> {
    let prefix = extraction_root.map(|root| format!("{}/", root.trim_end_matches('/')));
    let mut members = Vec::new();
    for index in 0..archive.len() {
        let file = archive.by_index_raw(index).map_err(|e| {
            ZimError::Archive(format!(
                "Error reading ZIP index {} in {}: {}",
                index,
                archive_path.display(),
                e
            ))
        })?;
        let name = normalize_entry_name(file.name());
        let relative = match &prefix {
            Some(prefix) => match name.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.to_string(),
                None => continue,
            },
            None => name.clone(),
        };
        let is_dir = file.is_dir() || relative.ends_with('/');
        let relative = relative.trim_end_matches('/').to_string();
        if relative.is_empty() {
            continue;
        }
        members.push(Member {
            index,
            relative,
            is_dir,
        });
    }
    Ok(members)
}

/// Joins an archive-relative path onto `root`, refusing anything that would
/// land outside it.
pub(crate) fn safe_join(root: &Path, relative: &str) -> Result<PathBuf> {
    if relative.starts_with('/') {
        error!("Absolute path in archive: {}", relative);
        return Err(ZimError::Archive(format!(
            "Disallowed absolute path in archive: {relative}"
        )));
    }
    if has_drive_prefix(relative) {
        error!("Drive-qualified path in archive: {}", relative);
        return Err(ZimError::Archive(format!(
            "Disallowed drive prefix in archive path {relative}"
        )));
    }
    let mut path = root.to_path_buf();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                error!("Unsafe '..' in archive path {}", relative);
                return Err(ZimError::Archive(format!(
                    "Unsafe '..' component in archive path {relative}"
                )));
            }
            s => path.push(s),
        }
    }
    Ok(path)
}

/// `C:` style first segment.
fn has_drive_prefix(relative: &str) -> bool {
    let bytes = relative.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{drain, progress_values, write_zip};

    #[test]
    fn root_is_stripped_and_outside_members_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let zip = write_zip(
            tmp.path(),
            "a.zip",
            &[
                ("MyApp/", ""),
                ("MyApp/app.exe", "MZ"),
                ("MyApp/res/icon.ico", "ico"),
                ("Other/ignored.txt", "nope"),
            ],
        );
        let target = tmp.path().join("out");
        let files =
            extract_members(&zip, &target, Some("MyApp"), &ProgressReporter::silent("t")).unwrap();
        assert_eq!(files, vec!["app.exe", "res/icon.ico"]);
        assert!(target.join("app.exe").is_file());
        assert!(target.join("res/icon.ico").is_file());
        assert!(!target.join("Other").exists());
        assert!(!target.join("MyApp").exists());
    }

    #[test]
    fn traversal_is_rejected() {
        let root = Path::new("/opt/app");
        assert!(matches!(safe_join(root, "../evil"), Err(ZimError::Archive(_))));
        assert!(matches!(safe_join(root, "a/../../evil"), Err(ZimError::Archive(_))));
        assert!(matches!(safe_join(root, "/etc/passwd"), Err(ZimError::Archive(_))));
        assert!(matches!(safe_join(root, "C:/x"), Err(ZimError::Archive(_))));
        assert!(matches!(safe_join(root, "d:evil.txt"), Err(ZimError::Archive(_))));
        assert_eq!(safe_join(root, "./a/b.txt").unwrap(), root.join("a").join("b.txt"));
        assert_eq!(
            safe_join(root, "docs/notes:v1.txt").unwrap(),
            root.join("docs").join("notes:v1.txt")
        );
    }

    #[cfg(unix)]
    #[test]
    fn colon_inside_a_name_extracts() {
        let tmp = tempfile::tempdir().unwrap();
        let zip = write_zip(
            tmp.path(),
            "a.zip",
            &[("app.exe", "MZ"), ("docs/notes:v1.txt", "notes")],
        );
        let target = tmp.path().join("out");
        let files = extract_members(&zip, &target, None, &ProgressReporter::silent("t")).unwrap();
        assert_eq!(files, vec!["app.exe", "docs/notes:v1.txt"]);
        assert!(target.join("docs/notes:v1.txt").is_file());
    }

    #[test]
    fn extraction_progress_stays_in_band() {
        let tmp = tempfile::tempdir().unwrap();
        let names: Vec<String> = (0..45).map(|i| format!("f{i:02}.txt")).collect();
        let entries: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "x")).collect();
        let zip = write_zip(tmp.path(), "many.zip", &entries);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let reporter = ProgressReporter::new("t", tx);
        let files = extract_members(&zip, &tmp.path().join("out"), None, &reporter).unwrap();
        assert_eq!(files.len(), 45);
        let progress = progress_values(&drain(&mut rx));
        assert_eq!(progress.first(), Some(&10));
        assert!(progress.iter().all(|p| (10..60).contains(p)));
        assert!(progress.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn single_member_is_found_by_normalized_name() {
        let tmp = tempfile::tempdir().unwrap();
        let zip = write_zip(tmp.path(), "a.zip", &[("Tool/tool.exe", "MZ-tool")]);
        let dest = tmp.path().join("scratch/tool.exe");
        extract_single(&zip, r"Tool\tool.exe", &dest).unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "MZ-tool");
        assert!(matches!(
            extract_single(&zip, "missing.exe", &dest),
            Err(ZimError::NotFound(_))
        ));
    }
}
