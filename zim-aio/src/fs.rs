// zim-aio/src/fs.rs
//! Primitive synchronous filesystem operations.
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{debug, error, warn};
use walkdir::WalkDir;
use zim_common::error::{Result, ZimError};

/// Creates a directory and all its parent components if they are missing.
/// An already existing directory is not an error.
pub fn create_dir_all(path: &Path) -> Result<()> {
    debug!("Creating directory recursively: {}", path.display());
    fs::create_dir_all(path).map_err(|e| {
        error!("Failed create dir {}: {}", path.display(), e);
        ZimError::io_at(e, "create directory", path)
    })
}

/// Removes a file.
pub fn remove_file(path: &Path) -> Result<()> {
    debug!("Removing file: {}", path.display());
    fs::remove_file(path).map_err(|e| {
        if e.kind() != io::ErrorKind::NotFound {
            error!("Failed remove file {}: {}", path.display(), e);
        }
        ZimError::from(e)
    })
}

/// Removes an empty directory.
pub fn remove_dir(path: &Path) -> Result<()> {
    debug!("Removing directory: {}", path.display());
    fs::remove_dir(path).map_err(|e| {
        if e.kind() != io::ErrorKind::NotFound {
            debug!("Failed remove dir {}: {}", path.display(), e);
        }
        ZimError::from(e)
    })
}

/// Copies a file, overwriting the destination. Returns the number of bytes copied.
pub fn copy_file(from: &Path, to: &Path) -> Result<u64> {
    debug!("Copying {} -> {}", from.display(), to.display());
    if let Some(parent) = to.parent() {
        create_dir_all(parent)?;
    }
    fs::copy(from, to).map_err(|e| {
        error!(
            "Failed copy {} -> {}: {}",
            from.display(),
            to.display(),
            e
        );
        ZimError::io_at(e, "copy to", to)
    })
}

/// Writes a stream into a fresh file at `path`, replacing whatever was there.
pub fn write_stream<R: io::Read + ?Sized>(reader: &mut R, path: &Path) -> Result<u64> {
    if path.symlink_metadata().is_ok() {
        match fs::remove_file(path) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ZimError::io_at(e, "replace", path)),
        }
    }
    let mut out_file = File::create(path).map_err(|e| ZimError::io_at(e, "create file", path))?;
    io::copy(reader, &mut out_file).map_err(|e| ZimError::io_at(e, "write", path))
}

/// Sum of the sizes of all regular files below `path`. Unreadable entries are skipped.
pub fn directory_size(path: &Path) -> u64 {
    let mut total = 0;
    for entry in WalkDir::new(path) {
        match entry {
            Ok(entry) if entry.file_type().is_file() => match entry.metadata() {
                Ok(metadata) => total += metadata.len(),
                Err(e) => warn!(
                    "Could not get metadata for {}: {}",
                    entry.path().display(),
                    e
                ),
            },
            Ok(_) => {}
            Err(e) => warn!("Error traversing directory {}: {}", path.display(), e),
        }
    }
    total
}

/// Result of listing the regular files below a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileListing {
    /// Regular files in walk order (symlinks are not followed).
    pub files: Vec<PathBuf>,
    /// Entries the walk could not read; their contents are not in `files`.
    pub unreadable: Vec<PathBuf>,
}

/// All regular files below `root`. Unreadable entries are logged and listed
/// separately instead of ending the walk.
pub fn regular_files_under(root: &Path) -> FileListing {
    let mut listing = FileListing::default();
    for entry in WalkDir::new(root).min_depth(1) {
        match entry {
            Ok(entry) if entry.file_type().is_file() => listing.files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                warn!("Error traversing {}: {}", path.display(), e);
                listing.unreadable.push(path);
            }
        }
    }
    listing
}

/// Directories strictly below `root`, deepest first, so that each can be
/// removed after its children.
pub fn directories_deepest_first(root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<(usize, PathBuf)> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| (e.depth(), e.into_path()))
        .collect();
    dirs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    dirs.into_iter().map(|(_, p)| p).collect()
}

/// Creates a symbolic link. Unix only.
#[cfg(unix)]
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    debug!("Creating symlink {} -> {}", link.display(), target.display());
    std::os::unix::fs::symlink(target, link).map_err(|e| {
        error!(
            "Failed create symlink {} -> {}: {}",
            link.display(),
            target.display(),
            e
        );
        ZimError::from(e)
    })
}

#[cfg(not(unix))]
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    warn!(
        "Symlink creation not supported on this platform: {} -> {}",
        link.display(),
        target.display()
    );
    Err(ZimError::Generic(
        "Symlinks not supported on this platform".to_string(),
    ))
}

/// Sets file permissions (Unix only). Mode is standard Unix octal mode.
#[cfg(unix)]
pub fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    debug!("Setting permissions on {}: {:o}", path.display(), mode);
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| {
        error!("Failed set permissions on {}: {}", path.display(), e);
        ZimError::from(e)
    })
}

#[cfg(not(unix))]
pub fn set_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Atomically writes data to a file using a temporary file in the same directory.
/// Readers see either the old content or the complete new content.
pub fn atomic_write_file(original_path: &Path, content: &[u8]) -> Result<()> {
    let dir = original_path.parent().ok_or_else(|| {
        ZimError::Generic(format!(
            "Cannot get parent directory for {}",
            original_path.display()
        ))
    })?;

    create_dir_all(dir)?;

    let mut temp_file = NamedTempFile::new_in(dir)?;
    let temp_path = temp_file.path().to_path_buf();

    debug!(
        "Atomically writing {} bytes to {} via temp file {}",
        content.len(),
        original_path.display(),
        temp_path.display()
    );

    temp_file.write_all(content)?;
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;

    temp_file.persist(original_path).map_err(|e| {
        error!(
            "Failed to persist temporary file {} over {}: {}",
            temp_path.display(),
            original_path.display(),
            e.error
        );
        ZimError::Io(Arc::new(e.error))
    })?;

    #[cfg(unix)]
    if let Err(e) = set_permissions(original_path, 0o644) {
        warn!(
            "Failed to set default permissions on {}: {}",
            original_path.display(),
            e
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_size_counts_nested_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        fs::write(tmp.path().join("top.bin"), [0u8; 10]).unwrap();
        fs::write(tmp.path().join("a/b/deep.bin"), [0u8; 32]).unwrap();
        assert_eq!(directory_size(tmp.path()), 42);
    }

    #[test]
    fn deepest_directories_come_first() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("a/b/c")).unwrap();
        fs::create_dir_all(tmp.path().join("d")).unwrap();
        let dirs = directories_deepest_first(tmp.path());
        assert_eq!(dirs.first(), Some(&tmp.path().join("a/b/c")));
        let pos_b = dirs.iter().position(|d| d == &tmp.path().join("a/b")).unwrap();
        let pos_a = dirs.iter().position(|d| d == &tmp.path().join("a")).unwrap();
        assert!(pos_b < pos_a);
        assert_eq!(dirs.len(), 4);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_does_not_end_the_listing() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), b"a").unwrap();
        let locked = tmp.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("blob"), b"b").unwrap();
        set_permissions(&locked, 0o000).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // root ignores permission bits
            set_permissions(&locked, 0o755).unwrap();
            return;
        }

        let listing = regular_files_under(tmp.path());
        set_permissions(&locked, 0o755).unwrap();
        assert_eq!(listing.files, vec![tmp.path().join("a.txt")]);
        assert_eq!(listing.unreadable, vec![locked]);
    }

    #[test]
    fn atomic_write_replaces_content() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("nested/out.json");
        atomic_write_file(&target, b"first").unwrap();
        atomic_write_file(&target, b"second").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
        assert_eq!(fs::read_dir(target.parent().unwrap()).unwrap().count(), 1);
    }
}
