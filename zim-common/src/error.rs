use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ZimError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("ZIP Error: {0}")]
    Zip(#[from] Arc<zip::result::ZipError>),

    #[error("Directory Walk Error: {0}")]
    Walk(#[from] Arc<walkdir::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Archive Error: {0}")]
    Archive(String),

    #[error("Installation Error: {0}")]
    InstallError(String),

    #[error("Installation information file not found: {0}")]
    ManifestNotFound(String),

    #[error("Invalid installation information in {0}: {1}")]
    ManifestError(String, String),

    #[error("System Integration Error: {0}")]
    Integration(String),

    #[error("Version error: {0}")]
    VersionError(String),

    #[error("Resource Not Found: {0}")]
    NotFound(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for ZimError {
    fn from(err: std::io::Error) -> Self {
        ZimError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for ZimError {
    fn from(err: serde_json::Error) -> Self {
        ZimError::Json(Arc::new(err))
    }
}

impl From<zip::result::ZipError> for ZimError {
    fn from(err: zip::result::ZipError) -> Self {
        ZimError::Zip(Arc::new(err))
    }
}

impl From<walkdir::Error> for ZimError {
    fn from(err: walkdir::Error) -> Self {
        ZimError::Walk(Arc::new(err))
    }
}

impl ZimError {
    /// Wraps an I/O error with the path it happened on, keeping the error kind.
    pub fn io_at(err: std::io::Error, action: &str, path: &std::path::Path) -> Self {
        ZimError::Io(Arc::new(std::io::Error::new(
            err.kind(),
            format!("Failed to {} {}: {}", action, path.display(), err),
        )))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ZimError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, ZimError>;
