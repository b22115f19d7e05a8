// zim-core/src/uninstall/common.rs

use std::path::Path;
use std::{fs, io};

use tracing::debug;

/// Result of trying to delete one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Removal {
    Removed,
    /// Already gone; nothing to do.
    Absent,
    Failed(String),
}

/// Removes a file or symlink. Directories are never touched here.
pub(crate) fn remove_file_artifact(path: &Path) -> Removal {
    match path.symlink_metadata() {
        Ok(metadata) if metadata.is_dir() => {
            Removal::Failed(format!("{} is a directory", path.display()))
        }
        Ok(_) => match fs::remove_file(path) {
            Ok(()) => {
                debug!("Removed {}", path.display());
                Removal::Removed
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Removal::Absent,
            Err(e) => Removal::Failed(e.to_string()),
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => Removal::Absent,
        Err(e) => Removal::Failed(e.to_string()),
    }
}

/// Removes every empty directory below `root`, deepest first. `root` itself is
/// kept. Directories that still hold something are left alone.
pub(crate) fn prune_empty_dirs(root: &Path) -> usize {
    let mut removed = 0;
    for dir in zim_aio::fs::directories_deepest_first(root) {
        let is_empty = fs::read_dir(&dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty && zim_aio::fs::remove_dir(&dir).is_ok() {
            removed += 1;
        }
    }
    removed
}
