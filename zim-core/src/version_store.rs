// zim-core/src/version_store.rs
//! Where the tool's own version comes from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use zim_common::error::{Result, ZimError};
use zim_common::model::VersionTuple;

pub trait VersionStore: Send + Sync {
    fn read(&self) -> Result<String>;

    /// Bumps the build component and returns the new version.
    fn increment(&self) -> Result<String>;
}

/// Version a fresh checkout starts from when no version file exists.
pub const INITIAL_VERSION: VersionTuple = VersionTuple::new(0, 9, 0, 0);

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct VersionFile {
    major: u64,
    minor: u64,
    patch: u64,
    build: u64,
}

impl From<VersionFile> for VersionTuple {
    fn from(v: VersionFile) -> Self {
        VersionTuple::new(v.major, v.minor, v.patch, v.build)
    }
}

impl From<VersionTuple> for VersionFile {
    fn from(v: VersionTuple) -> Self {
        Self {
            major: v.major,
            minor: v.minor,
            patch: v.patch,
            build: v.build,
        }
    }
}

/// Version persisted as `{major, minor, patch, build}` JSON.
#[derive(Debug, Clone)]
pub struct JsonVersionStore {
    path: PathBuf,
}

impl JsonVersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<VersionTuple> {
        if !self.path.exists() {
            debug!("No version file at {}, using {}", self.path.display(), INITIAL_VERSION);
            return Ok(INITIAL_VERSION);
        }
        let file: VersionFile = zim_aio::read_json(&self.path).map_err(|e| {
            ZimError::VersionError(format!(
                "Invalid version file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(file.into())
    }
}

impl VersionStore for JsonVersionStore {
    fn read(&self) -> Result<String> {
        Ok(self.load()?.to_string())
    }

    fn increment(&self) -> Result<String> {
        let mut version = self.load()?;
        version.build += 1;
        zim_aio::write_json(&self.path, &VersionFile::from(version))?;
        debug!("Version bumped to {}", version);
        Ok(version.to_string())
    }
}

/// A version fixed at build time.
#[derive(Debug, Clone)]
pub struct StaticVersionStore {
    version: String,
}

impl StaticVersionStore {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// The version of this crate as compiled.
    pub fn compiled() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

impl VersionStore for StaticVersionStore {
    fn read(&self) -> Result<String> {
        Ok(self.version.clone())
    }

    fn increment(&self) -> Result<String> {
        Err(ZimError::VersionError(format!(
            "Version {} is fixed at build time",
            self.version
        )))
    }
}
