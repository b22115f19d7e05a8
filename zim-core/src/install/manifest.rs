// zim-core/src/install/manifest.rs
use std::path::{Path, PathBuf};

use tracing::debug;
use zim_common::config::MANIFEST_FILENAME;
use zim_common::error::{Result, ZimError};
use zim_common::model::InstallManifest;

pub fn manifest_path(install_dir: &Path) -> PathBuf {
    install_dir.join(MANIFEST_FILENAME)
}

/// Writes `install_info.json` into `install_dir` atomically.
pub fn write_manifest(install_dir: &Path, manifest: &InstallManifest) -> Result<PathBuf> {
    let path = manifest_path(install_dir);
    zim_aio::write_json(&path, manifest)?;
    debug!("Wrote manifest {}", path.display());
    Ok(path)
}

/// Loads the manifest of `install_dir`, with optional fields defaulted.
pub fn read_manifest(install_dir: &Path) -> Result<InstallManifest> {
    let path = manifest_path(install_dir);
    if !path.is_file() {
        return Err(ZimError::ManifestNotFound(path.display().to_string()));
    }
    let manifest: InstallManifest = zim_aio::read_json(&path).map_err(|e| match e {
        ZimError::Json(inner) => ZimError::ManifestError(path.display().to_string(), inner.to_string()),
        other => other,
    })?;
    Ok(manifest.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zim_common::model::ManifestSkeleton;

    #[test]
    fn round_trip_and_failure_modes() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_manifest(tmp.path()),
            Err(ZimError::ManifestNotFound(_))
        ));

        let manifest = ManifestSkeleton::new("App", "app.exe").into_manifest(
            tmp.path(),
            vec!["app.exe".to_string()],
            2,
        );
        write_manifest(tmp.path(), &manifest).unwrap();
        assert_eq!(read_manifest(tmp.path()).unwrap(), manifest);

        std::fs::write(manifest_path(tmp.path()), br#"{"name": "App"}"#).unwrap();
        assert!(matches!(
            read_manifest(tmp.path()),
            Err(ZimError::ManifestError(_, _))
        ));
    }
}
